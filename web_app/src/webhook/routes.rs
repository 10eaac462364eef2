use ntex::web;

/// Configures webhook routes for external integrations.
///
/// These routes are public; requests authenticate with the payload signature.
///
/// # Routes
/// - `GET /webhook/messenger` - Messenger webhook verification
/// - `POST /webhook/messenger` - Messenger webhook receiver
pub fn messenger(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook/messenger")
            .service((super::messenger::verify, super::messenger::receive)),
    );
}
