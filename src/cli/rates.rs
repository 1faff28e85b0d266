use super::holdings::fetch_rates_or_fallback;
use super::ui;
use crate::core::{FxRateProvider, FxRateTable};
use anyhow::Result;
use comfy_table::{Cell, Color};

pub async fn run(fx_provider: &(dyn FxRateProvider + Send + Sync)) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let rates = fetch_rates_or_fallback(fx_provider).await;
    pb.finish_and_clear();

    println!("{}", render_rates(&rates));
    Ok(())
}

pub fn render_rates(rates: &FxRateTable) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Symbol"),
        ui::header_cell("Per 1 USD"),
    ]);

    for (currency, rate) in rates.iter() {
        let rate_cell = if rates.is_available(currency) {
            ui::number_cell(format!("{rate:.4}"))
        } else {
            Cell::new("unavailable").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(currency.code()),
            Cell::new(currency.symbol()),
            rate_cell,
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Exchange Rates (USD base)", ui::StyleType::Title),
        table
    )
}
