use super::{show, ui};
use crate::engine::Resolution;
use crate::portfolio::Portfolio;
use crate::scheduler::{NoopObserver, RefreshScheduler};
use anyhow::{Result, bail};

/// Starts tracking a fund and estimates it right away.
pub async fn add(
    scheduler: &RefreshScheduler,
    portfolio: &mut Portfolio,
    code: &str,
    amount: f64,
) -> Result<()> {
    let code = portfolio.add(code, amount)?.code.clone();
    portfolio.save(scheduler.store()).await?;

    let pb = ui::new_progress_bar(1, true);
    pb.set_message(format!("Resolving holdings for {code}..."));
    let resolution = scheduler.refresh_fund(portfolio, &code, &NoopObserver).await;
    pb.finish_and_clear();

    match resolution? {
        Resolution::Resolved => {
            if let Some(fund) = portfolio.get(&code) {
                println!("{}", fund.holdings_as_table());
            }
            Ok(())
        }
        Resolution::Unresolvable => {
            bail!("No holdings disclosed for fund {code} in the last two quarters, not tracking it")
        }
    }
}

pub async fn remove(
    scheduler: &RefreshScheduler,
    portfolio: &mut Portfolio,
    code: &str,
) -> Result<()> {
    let code = code.trim();
    let Some(fund) = portfolio.remove(code) else {
        bail!("Fund {code} is not tracked");
    };
    portfolio.save(scheduler.store()).await?;

    println!(
        "Stopped tracking {} ({})",
        ui::style_text(&fund.display_name, ui::StyleType::TotalLabel),
        fund.code
    );
    show::display_portfolio(portfolio, false);
    Ok(())
}
