//! A small htmx blog wired through the facade, exercised in memory.

use std::sync::Mutex;

use daedalus::prelude::*;
use daedalus_test::TestClient;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PostForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

impl Validate for PostForm {
    fn validate(&self, v: &mut Violations) {
        v.required("title", &self.title).min_len("body", &self.body, 3);
    }
}

#[derive(Default)]
struct Posts {
    titles: Mutex<Vec<String>>,
}

impl Controller for Posts {
    fn index<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let list = self
                .titles
                .lock()
                .map(|titles| titles.iter().map(|t| format!("<li>{t}</li>")).collect::<String>())
                .unwrap_or_default();
            ctx.send_html(format!("<ul>{list}</ul>"), StatusCode::OK)
        })
    }

    fn store<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            match ctx.decode_and_validate::<PostForm>() {
                Decoded::Valid(form) => {
                    if let Ok(mut titles) = self.titles.lock() {
                        titles.push(form.title);
                    }
                    let url = ctx.make_url("home", &[])?;
                    ctx.redirect(&url)
                }
                Decoded::Invalid(_, errors) => ctx.send_json(&errors, StatusCode::UNPROCESSABLE_ENTITY),
                Decoded::Malformed(err) => Err(err),
            }
        })
    }
}

fn blog() -> TestClient {
    let mut router = Router::new();

    router.use_middleware(handler_fn(|ctx| {
        Box::pin(async move {
            if ctx.path().starts_with("/admin") && ctx.header("x-admin") != Some("yes") {
                return Err(StatusError::unauthorized().into());
            }
            ctx.next();
            Ok(())
        })
    }));

    router.render("/", "<h1>Welcome</h1>").name("home");
    router.get(
        "/admin/stats",
        handler_fn(|ctx| Box::pin(async move { ctx.send_text("42 posts", StatusCode::OK) })),
    );
    router.resource("/posts", Posts::default()).store();

    router.get(
        "/live",
        handler_fn(|ctx| {
            Box::pin(async move {
                ctx.send_sse("post", "first").await?;
                ctx.send_sse("post", "second").await?;
                Ok(())
            })
        }),
    );

    TestClient::from_router(router).unwrap()
}

#[tokio::test]
async fn test_render_home() {
    blog()
        .get("/")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("<h1>Welcome</h1>");
}

#[tokio::test]
async fn test_admin_requires_header() {
    let client = blog();
    client
        .get("/admin/stats")
        .send()
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    client
        .get("/admin/stats")
        .header("x-admin", "yes")
        .send()
        .await
        .assert_body_eq("42 posts");
}

#[tokio::test]
async fn test_store_validates_then_redirects() {
    let client = blog();

    let invalid = client
        .post("/posts")
        .form(&[("title", ""), ("body", "hi")])
        .send()
        .await;
    invalid.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let errors: std::collections::BTreeMap<String, String> = invalid.json().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.contains_key("title"));
    assert!(errors.contains_key("body"));

    client
        .post("/posts")
        .htmx()
        .form(&[("title", "Hello"), ("body", "First post")])
        .send()
        .await
        .assert_redirect("/");

    let index = client.get("/posts").send().await;
    index.assert_body_eq("<ul><li>Hello</li></ul>");
}

#[tokio::test]
async fn test_live_updates_stream() {
    let response = blog().get("/live").send().await;
    let events: Vec<(Option<String>, String)> = response
        .sse_events()
        .into_iter()
        .map(|e| (e.event, e.data))
        .collect();
    assert_eq!(
        events,
        vec![
            (Some("post".to_string()), "first".to_string()),
            (Some("post".to_string()), "second".to_string()),
        ]
    );
}

#[test]
fn test_app_key_shape() {
    let key = generate_app_key();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}
