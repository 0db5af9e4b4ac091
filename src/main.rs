use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::collections::HashMap;

mod card;
mod config;
mod delivery;
mod error;
mod ghapi;
mod relay;

use relay::{InboundEvent, Relay, RelayResponse};

/// GitHub caps deliveries at 25MB, but anything relayed here is far smaller.
const MAX_BODY: usize = 4 * 1024 * 1024;

/// Function-gateway proxy request.
#[derive(Debug, serde::Deserialize)]
struct ProxyEvent {
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default, rename = "isBase64Encoded")]
    is_base64_encoded: bool,
}

impl ProxyEvent {
    fn into_inbound(self) -> InboundEvent {
        // header names are case-insensitive, gateways may lowercase them
        let event_type = self.headers.and_then(|headers| {
            headers
                .into_iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(ghapi::EVENT_HEADER))
                .map(|(_, value)| value)
        });

        InboundEvent {
            event_type,
            body: self.body.unwrap_or_default(),
            is_base64_encoded: self.is_base64_encoded,
        }
    }
}

fn to_http(response: RelayResponse) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).body(response.body)
}

/// Direct delivery from GitHub.
async fn index(relay: web::Data<Relay>, req: HttpRequest, bytes: web::Bytes) -> HttpResponse {
    let event = InboundEvent {
        event_type: req
            .headers()
            .get(ghapi::EVENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&bytes).into_owned(),
        is_base64_encoded: false,
    };

    to_http(relay.handle(&event).await)
}

/// Delivery wrapped by a function gateway. The relay's status travels in the
/// returned document.
async fn invoke(relay: web::Data<Relay>, event: web::Json<ProxyEvent>) -> HttpResponse {
    let response = relay.handle(&event.into_inner().into_inbound()).await;
    HttpResponse::Ok().json(response)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let detail = err.to_string();
    log::warn!("bad proxy event: {}", detail);
    let resp = match &err {
        JsonPayloadError::ContentType => HttpResponse::UnsupportedMediaType().body(detail),
        JsonPayloadError::Deserialize(json_err) if json_err.is_data() => {
            HttpResponse::UnprocessableEntity().body(detail)
        }
        _ => HttpResponse::BadRequest().body(detail),
    };
    InternalError::from_response(err, resp).into()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY)
        .error_handler(json_error_handler)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::post().to(index)))
        .service(web::resource("/invoke").route(web::post().to(invoke)));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let env = |name: &str| std::env::var(name).ok();
    let config = config::Config::load(env)?;

    let relay = web::Data::new(Relay {
        url_source: config.url_source(env)?,
        notifier: Box::new(delivery::WebhookNotifier),
        issue_comment_link: config.issue_comment_link,
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(json_config())
            .app_data(web::PayloadConfig::new(MAX_BODY))
            .app_data(relay.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    });

    let server = match &config.tls {
        Some(tls) => {
            let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;
            builder.set_private_key_file(&tls.key, SslFiletype::PEM)?;
            builder.set_certificate_chain_file(&tls.cert)?;
            server.bind_openssl(&config.listen, builder)?
        }
        None => server.bind(&config.listen)?,
    };

    log::info!("relaying webhooks on {}", config.listen);
    server.run().await?;

    Ok(())
}
