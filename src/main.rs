use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{info, warn, Level};

use rental_bench::generators::GeneratorConfig;
use rental_bench::hooks::{AfterAction, Context, EntityKind, RequestParams, ScenarioHooks};
use rental_bench::stats::EndpointClassifier;
use rental_bench::store::PersistMode;

/// Seeding and smoke driver: plays the harness role for local runs by
/// generating payloads, firing them at the target API and feeding the
/// responses back through the after-response hooks so the data files fill
/// with real server-assigned records.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let base_url = env_or("RENTAL_API_URL", "http://localhost:8080/rest");
    let data_dir = PathBuf::from(env_or("RENTAL_DATA_DIR", "data"));
    let images_dir = PathBuf::from(env_or("RENTAL_IMAGES_DIR", "images"));
    let users_n = env_count("RENTAL_SEED_USERS", 20);
    let houses_n = env_count("RENTAL_SEED_HOUSES", 30);
    let images_n = env_count("RENTAL_SEED_IMAGES", 5);
    let sessions_n = env_count("RENTAL_SESSIONS", 50);

    fs::create_dir_all(&data_dir).context("create data directory")?;

    let mut hooks =
        ScenarioHooks::load(&data_dir, GeneratorConfig::default(), PersistMode::AppendLine);
    hooks.load_images(&images_dir, 40);

    info!(
        "loaded {} users, {} houses, {} questions, {} rentals from {}",
        hooks.users().len(),
        hooks.houses().len(),
        hooks.questions().len(),
        hooks.rentals().len(),
        data_dir.display()
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("create HTTP client")?;

    let classifier = EndpointClassifier::new([
        ("/rest/media", "POST"),
        ("/rest/user", "POST"),
        ("/rest/house/", "POST"),
        ("/rest/house", "POST"),
    ]);
    let mut stats: HashMap<String, u32> = HashMap::new();

    info!("uploading {} images", images_n);
    for _ in 0..images_n {
        let mut params = RequestParams::default();
        hooks.upload_image_body(&mut params);
        let Some(bytes) = params.body else { break };
        let url = format!("{base_url}/media");
        match client.post(&url).body(bytes).send().await {
            Ok(resp) => info!("media upload: {}", resp.status()),
            Err(err) => warn!("media upload failed: {err}"),
        }
        bump(&mut stats, &classifier, "/rest/media", "POST");
    }

    info!("seeding {} users", users_n);
    for _ in 0..users_n {
        let mut ctx = Context::new();
        hooks.before_request(EntityKind::User, &mut ctx);
        let body = body_from(&ctx, &["id", "name", "pwd"]);
        bump(&mut stats, &classifier, "/rest/user", "POST");
        if let Some((status, text)) = post(&client, &format!("{base_url}/user"), &body).await {
            hooks.after_response(EntityKind::User, status, &text);
        }
    }

    info!("seeding {} houses", houses_n);
    for _ in 0..houses_n {
        let mut ctx = Context::new();
        hooks.before_request(EntityKind::House, &mut ctx);
        let body = body_from(
            &ctx,
            &["id", "name", "location", "description", "ownerId", "price", "discount"],
        );
        bump(&mut stats, &classifier, "/rest/house", "POST");
        if let Some((status, text)) = post(&client, &format!("{base_url}/house"), &body).await {
            hooks.after_response(EntityKind::House, status, &text);
        }
    }

    info!("running {} think sessions", sessions_n);
    for _ in 0..sessions_n {
        let mut ctx = Context::new();
        hooks.select_user_skewed(&mut ctx);
        if !ctx.contains("user") {
            warn!("no users recorded, skipping think sessions");
            break;
        }
        loop {
            let action = hooks.decide_next_action(&mut ctx);
            match action.after {
                AfterAction::PostQuestion { .. } => {
                    let mut qctx = Context::new();
                    hooks.before_request(EntityKind::Question, &mut qctx);
                    if let Some(house_id) = qctx.get_str("houseId").map(str::to_string) {
                        let body = body_from(&qctx, &["askerId", "text"]);
                        let path = format!("/rest/house/{house_id}/question");
                        bump(&mut stats, &classifier, &path, "POST");
                        let url = format!("{base_url}/house/{house_id}/question");
                        if let Some((status, text)) = post(&client, &url, &body).await {
                            hooks.after_response(EntityKind::Question, status, &text);
                        }
                    }
                }
                AfterAction::Reserve => {
                    let mut rctx = Context::new();
                    hooks.before_request(EntityKind::Rental, &mut rctx);
                    if let Some(house_id) = rctx.get_str("houseId").map(str::to_string) {
                        let body = body_from(&rctx, &["userId", "initialDate", "endDate"]);
                        let path = format!("/rest/house/{house_id}/rental");
                        bump(&mut stats, &classifier, &path, "POST");
                        let url = format!("{base_url}/house/{house_id}/rental");
                        if let Some((status, text)) = post(&client, &url, &body).await {
                            hooks.after_response(EntityKind::Rental, status, &text);
                        }
                    }
                }
                _ => {}
            }
            if !hooks.continue_looping(0.5) {
                break;
            }
        }
    }

    info!(
        "done: {} users, {} houses, {} questions, {} rentals recorded",
        hooks.users().len(),
        hooks.houses().len(),
        hooks.questions().len(),
        hooks.rentals().len()
    );
    let mut labels: Vec<_> = stats.iter().collect();
    labels.sort();
    for (label, count) in labels {
        info!("{label}: {count} requests");
    }

    Ok(())
}

async fn post(client: &Client, url: &str, body: &Value) -> Option<(u16, String)> {
    match client.post(url).json(body).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            Some((status, text))
        }
        Err(err) => {
            warn!("request to {url} failed: {err}");
            None
        }
    }
}

/// Assemble a JSON body from the context vars, skipping absent keys the
/// same way the harness templates drop deleted variables.
fn body_from(ctx: &Context, keys: &[&str]) -> Value {
    let mut map = Map::new();
    for &key in keys {
        if let Some(value) = ctx.get(key) {
            map.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(map)
}

fn bump(
    stats: &mut HashMap<String, u32>,
    classifier: &EndpointClassifier,
    path: &str,
    method: &str,
) {
    *stats.entry(classifier.classify(path, method)).or_insert(0) += 1;
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_count(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
