use super::{show, ui};
use crate::portfolio::Portfolio;
use crate::scheduler::{RefreshObserver, RefreshScheduler};
use anyhow::Result;
use chrono::Local;
use tracing::{error, info};

/// Redraws the whole portfolio after every refresh pass.
struct RenderObserver {
    with_holdings: bool,
}

impl RefreshObserver for RenderObserver {
    fn fund_removed(&self, code: &str) {
        println!(
            "{}",
            ui::style_text(
                &format!("No holdings disclosed for {code}, no longer tracking it"),
                ui::StyleType::Error
            )
        );
    }

    fn pass_completed(&self, portfolio: &Portfolio) {
        if let Err(e) = console::Term::stdout().clear_screen() {
            error!(error = %e, "Failed to clear terminal");
        }
        println!(
            "{}\n",
            ui::style_text(
                &format!("Updated {}", Local::now().format("%H:%M:%S")),
                ui::StyleType::Subtle
            )
        );
        show::display_portfolio(portfolio, self.with_holdings);
    }
}

pub async fn run(
    scheduler: &RefreshScheduler,
    portfolio: &mut Portfolio,
    with_holdings: bool,
) -> Result<()> {
    if portfolio.is_empty() {
        show::display_portfolio(portfolio, with_holdings);
        return Ok(());
    }

    let observer = RenderObserver { with_holdings };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    let passes = scheduler.run_until(portfolio, &observer, shutdown).await;
    info!(passes, "Stopped watching");
    Ok(())
}
