use super::ui;
use crate::core::Fund;
use crate::portfolio::Portfolio;
use crate::scheduler::{RefreshObserver, RefreshScheduler};
use anyhow::Result;
use comfy_table::Cell;
use indicatif::ProgressBar;

/// Advances a progress bar as funds are refreshed.
pub struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    pub fn new(len: usize) -> Self {
        let pb = ui::new_progress_bar(len as u64, true);
        pb.set_message("Estimating funds...");
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl RefreshObserver for ProgressObserver {
    fn fund_updated(&self, fund: &Fund) {
        self.pb.set_message(fund.display_name.clone());
        self.pb.inc(1);
    }

    fn fund_removed(&self, code: &str) {
        self.pb.println(ui::style_text(
            &format!("No holdings disclosed for {code}, no longer tracking it"),
            ui::StyleType::Error,
        ));
        self.pb.inc(1);
    }
}

impl Fund {
    pub fn holdings_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Security"),
            ui::header_cell("Code"),
            ui::header_cell("Weight (%)"),
            ui::header_cell("Change"),
        ]);

        for holding in &self.holdings {
            table.add_row(vec![
                Cell::new(&holding.security_name),
                Cell::new(&holding.security_code),
                ui::amount_cell(holding.portfolio_weight_percent),
                ui::change_cell(holding.live_change_percent),
            ]);
        }

        let date = if self.disclosure_date_label.is_empty() {
            String::new()
        } else {
            ui::style_text(
                &format!(" (as of {})", self.disclosure_date_label),
                ui::StyleType::Subtle,
            )
        };
        format!(
            "{}{date}\n{table}",
            ui::style_text(&self.display_name, ui::StyleType::Title)
        )
    }
}

impl Portfolio {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Fund"),
            ui::header_cell("Code"),
            ui::header_cell("Held"),
            ui::header_cell("Estimate"),
            ui::header_cell("Est. Profit"),
            ui::header_cell("Holdings"),
            ui::header_cell("Disclosed"),
        ]);

        for fund in self.funds() {
            let profit = fund.estimated_profit();
            table.add_row(vec![
                Cell::new(&fund.display_name),
                Cell::new(&fund.code),
                ui::amount_cell(fund.held_amount),
                ui::change_cell(fund.estimate_rate_percent),
                ui::signed_cell(profit, format!("{profit:+.2}")),
                Cell::new(fund.holdings.len()),
                Cell::new(&fund.disclosure_date_label),
            ]);
        }

        let summary = self.summary();
        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\n{} {:.2}\n{} {}",
            ui::style_text("Total Held:", ui::StyleType::TotalLabel),
            summary.total_held_amount,
            ui::style_text("Estimated Profit:", ui::StyleType::TotalLabel),
            ui::style_signed(
                summary.total_estimated_profit,
                &format!("{:+.2}", summary.total_estimated_profit)
            ),
        ));
        output
    }
}

pub fn display_portfolio(portfolio: &Portfolio, with_holdings: bool) {
    if portfolio.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No funds tracked. Use `mfest add <CODE> <AMOUNT>` to start.",
                ui::StyleType::Subtle
            )
        );
        return;
    }

    println!("{}", portfolio.display_as_table());
    if with_holdings {
        for fund in portfolio.funds() {
            ui::print_separator();
            println!("{}", fund.holdings_as_table());
        }
    }
}

/// Refreshes every tracked fund once and prints the result.
pub async fn run(
    scheduler: &RefreshScheduler,
    portfolio: &mut Portfolio,
    with_holdings: bool,
) -> Result<()> {
    let observer = ProgressObserver::new(portfolio.len());
    scheduler.run_pass(portfolio, &observer).await;
    observer.finish();

    display_portfolio(portfolio, with_holdings);
    Ok(())
}
