use super::compare::{CompareRequest, render};
use super::ui;
use crate::core::{RateSync, compare};
use anyhow::Result;
use tracing::debug;

/// Prints the comparison, then prints it again after every rate update until
/// interrupted.
pub async fn run(
    sync: &RateSync,
    request: &CompareRequest,
    remote_configured: bool,
) -> Result<()> {
    let mut updates = sync.updates();
    print_comparison(sync, request);

    if !remote_configured {
        println!(
            "{}",
            ui::style_text(
                "No remote rates configured; nothing will change.",
                ui::StyleType::Subtle
            )
        );
    }
    println!("{}", ui::style_text("Press Ctrl-C to stop.", ui::StyleType::Subtle));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!("Rates changed, refreshing comparison");
                print_comparison(sync, request);
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    sync.stop();
    Ok(())
}

fn print_comparison(sync: &RateSync, request: &CompareRequest) {
    let results = compare(sync.store(), request.amount, request.currency, request.country);
    println!("\n{}", render(request, &results, sync.status()));
}
