use clap::{Args, Parser, Subcommand};

use crate::{config::AppConfig, utils};

#[derive(Args, Debug, Clone)]
pub struct SetGreetingArgs {
    #[arg(short, long)]
    text: String,
}

#[derive(Args, Debug, Clone)]
pub struct SetGetStartedArgs {
    #[arg(short, long)]
    payload: String,
}

#[derive(Args, Debug, Clone)]
pub struct SignPayloadArgs {
    #[arg(short, long)]
    file: String,
    #[arg(short, long, default_value = "sha256")]
    algorithm: String,
}

#[derive(Args, Debug, Clone)]
pub struct InspectPayloadArgs {
    #[arg(short, long)]
    file: String,
    #[arg(short, long, default_value = "page")]
    object_type: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Subscribe the app to the page webhooks
    SubscribePage,
    /// Set the greeting shown before a conversation starts
    SetGreeting(SetGreetingArgs),
    /// Set the payload of the get-started button
    SetGetStarted(SetGetStartedArgs),
    /// Print the signature header Meta would send for a payload file
    SignPayload(SignPayloadArgs),
    /// Parse a webhook payload file and list its events
    InspectPayload(InspectPayloadArgs),
}

/// Operator tools for the Messenger bot page
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        let app_config = AppConfig::load()?;

        match &self.action {
            Action::SubscribePage => {
                let response = utils::messenger_client(&app_config)?
                    .subscribe_to_page()
                    .await?;
                println!("{response}");
            }
            Action::SetGreeting(SetGreetingArgs { text }) => {
                let response = utils::messenger_client(&app_config)?
                    .set_greeting_text(text)
                    .await?;
                println!("{response}");
            }
            Action::SetGetStarted(SetGetStartedArgs { payload }) => {
                let response = utils::messenger_client(&app_config)?
                    .set_get_started_button_payload(payload)
                    .await?;
                println!("{response}");
            }
            Action::SignPayload(SignPayloadArgs { file, algorithm }) => {
                let body = utils::read_payload(file)?;
                println!(
                    "{}",
                    utils::sign_payload(app_config.app_secret()?, &body, algorithm)?
                );
            }
            Action::InspectPayload(InspectPayloadArgs { file, object_type }) => {
                let body = utils::read_payload(file)?;
                for line in utils::describe_payload(&body, object_type)? {
                    println!("{line}");
                }
            }
        }

        Ok(())
    }
}
