#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use cfgtree::{impl_configurable, Field, Group, Root, Settings, Value};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Installs a global subscriber once per test binary. `RUST_LOG` overrides
/// the default `debug` level.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(env_filter)
            .try_init();
    });
}

pub type Shared<T> = Rc<RefCell<T>>;

/// A typed object whose defaults are the awkward cases for text formats.
pub struct Profile {
    pub nickname: String,
    pub age: Option<u32>,
    pub level: u32,
}

impl_configurable!(Profile { nickname, age, level });

pub struct Fixture {
    pub server: Shared<Settings>,
    pub tls: Shared<Settings>,
    pub extra: Shared<Settings>,
    pub profile: Shared<Profile>,
    pub root: Root,
}

/// Builds the tree of `group` from a `Server` object (with a nested `Tls`
/// object, a null field and a nested object that has only private fields)
/// and a typed `Profile`.
pub fn server_group(group: &mut Group) -> Fixture {
    let tls = Rc::new(RefCell::new(
        Settings::new("Tls").with("cert", "server.pem").with("verify", true),
    ));
    let extra = Rc::new(RefCell::new(Settings::new("Extra").with("_secret", "hunter2")));
    let server = Rc::new(RefCell::new(
        Settings::new("Server")
            .with("host", "localhost")
            .with("port", 8080)
            .with("ratio", 0.5)
            .with("limit", Value::Null)
            .with_object("Tls", tls.clone())
            .with_object("Extra", extra.clone()),
    ));
    let profile = Rc::new(RefCell::new(Profile {
        nickname: String::new(),
        age: None,
        level: 3,
    }));
    group.add(tls.clone());
    group.add(extra.clone());
    group.add(server.clone());
    group.add(profile.clone());

    let mut root = Root::new();
    root.insert("Server".into(), Field::Object(server.clone()));
    root.insert("Profile".into(), Field::Object(profile.clone()));
    group.build_tree(&root).unwrap();

    Fixture {
        server,
        tls,
        extra,
        profile,
        root,
    }
}
