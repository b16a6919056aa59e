use std::sync::Arc;

use movemycar_dispatch::{Dispatcher, InMemoryStorage, Relay, Settings, Target};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();
    let storage = Arc::new(InMemoryStorage::new());
    let dispatcher = Arc::new(Dispatcher::new(settings.dispatcher_config()));
    let relay = Relay::new(storage.clone(), dispatcher, settings);

    let Ok(code) = relay.issue_share_code().await else {
        return;
    };
    let target = Target::new("car-1", "京A12345", code.clone(), "BARK", "device-key||api.day.app")
        .with_label("Office lot");
    storage.insert_target(target).await;

    match relay.notify(code.as_str(), Some("Blocking the gate")).await {
        Ok(reply) => println!("{reply:?}"),
        Err(err) => eprintln!("notify failed: {err}"),
    }
}
