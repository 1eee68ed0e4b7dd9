use serde::{Deserialize, Serialize};
use sonata::config::Config;
use sonata::middleware::{logging_with_config, recovery, LoggingConfig};
use sonata::routing::{handler, middleware};
use sonata::{Engine, StatusCode};

const INDEX_TEMPLATE: &str = "<h1>{{ title }}</h1><ul>{% for u in users %}<li>{{ u }}</li>{% endfor %}</ul>";

#[derive(Debug, Default, Deserialize, Serialize)]
struct Login {
    user: String,
    password: String,
    #[serde(default)]
    remember: bool,
}

sonata::schema!(Login { "user": required, "password": required, "remember" });

#[derive(Serialize)]
struct Profile<'a> {
    name: &'a str,
    role: &'a str,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let engine = build_engine(cfg)?;
    runtime.block_on(engine.run())?;
    Ok(())
}

fn build_engine(cfg: Config) -> sonata::Result<Engine> {
    let access_log = cfg.logging.access_log;
    let color = cfg.logging.color;
    let mut engine = Engine::with_config(cfg)?;

    engine.configure_templates(|env| {
        env.add_function("upper", |s: String| s.to_uppercase());
        if let Err(e) = env.add_template("index.html", INDEX_TEMPLATE) {
            eprintln!("[TEMPLATE] Failed to add index.html: {e}");
        }
    });

    let user = engine.group("user");
    user.use_middleware(recovery());
    if access_log {
        user.use_middleware(logging_with_config(LoggingConfig {
            color,
            ..LoggingConfig::default()
        }));
    }

    let powered_by = middleware(|next| {
        handler(move |ctx| {
            ctx.header("X-Powered-By", "sonata");
            next(ctx);
        })
    });

    user.get("/info", |ctx| {
        let name = ctx.default_query("name", "guest").to_string();
        let _ = ctx.json(StatusCode::OK, &Profile { name: &name, role: "member" });
    })
    .with(powered_by);

    user.get("/info.xml", |ctx| {
        let _ = ctx.xml(StatusCode::OK, &Profile { name: "guest", role: "member" });
    });

    user.post("/login", |ctx| {
        let mut login = Login::default();
        if ctx.bind_json(&mut login).is_err() {
            return;
        }
        if login.password.len() < 8 {
            let _ = ctx.string(StatusCode::UNAUTHORIZED, format_args!("password too short"));
            return;
        }
        let _ = ctx.string(
            StatusCode::OK,
            format_args!("welcome {} (remember: {})", login.user, login.remember),
        );
    });

    user.post("/form", |ctx| {
        let name = ctx.default_post_form("name", "anonymous").to_string();
        let tags = ctx.get_post_form_array("tag").map(|tags| tags.join(",")).unwrap_or_default();
        let _ = ctx.string(StatusCode::OK, format_args!("{name}: {tags}"));
    });

    user.get("/list", |ctx| {
        let data = serde_json::json!({ "title": "Users", "users": ["ada", "grace"] });
        let _ = ctx.html_template(StatusCode::OK, "index.html", &data);
    });

    user.get("/home", |ctx| {
        let _ = ctx.redirect(StatusCode::FOUND, "/user/info");
    });

    user.any("/ping", |ctx| {
        let _ = ctx.string(StatusCode::OK, format_args!("pong"));
    });

    Ok(engine)
}
