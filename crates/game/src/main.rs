use tracing::error;

mod app;

fn main() {
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(reason) => {
            error!(error = %reason, "bootstrap_failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = engine::run_app(wiring.config, wiring.title, wiring.overworld) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}
