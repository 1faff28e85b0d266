use super::ui;
use crate::core::format::{format_count, format_currency, format_percent, format_quantity};
use crate::core::report::{AssetReport, CombinedReport, build_asset_report, build_combined_report};
use crate::core::stats::{top_by_current_value, top_combined_by_current_value};
use crate::core::{Asset, FxRateProvider, FxRateTable, TreasuryPayload, TreasuryProvider};
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::{debug, warn};

/// Which treasury view to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AssetView {
    #[value(name = "btc", alias = "bitcoin")]
    Bitcoin,
    #[value(name = "eth", alias = "ethereum")]
    Ethereum,
    Both,
}

impl AssetView {
    pub fn includes(&self, asset: Asset) -> bool {
        match self {
            AssetView::Bitcoin => asset == Asset::Bitcoin,
            AssetView::Ethereum => asset == Asset::Ethereum,
            AssetView::Both => true,
        }
    }
}

pub struct HoldingsOptions<'a> {
    pub view: AssetView,
    pub currency: &'a str,
    pub top_n: usize,
    pub json: bool,
}

/// A requested asset whose treasury data could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub asset: Asset,
    pub message: String,
}

/// Reports and rates gathered for one view. Assets outside the view, or whose
/// fetch failed, carry an empty report.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingsData {
    pub view: AssetView,
    pub rates: FxRateTable,
    pub bitcoin: AssetReport,
    pub ethereum: AssetReport,
    pub failures: Vec<FetchFailure>,
}

impl HoldingsData {
    pub fn report(&self, asset: Asset) -> &AssetReport {
        match asset {
            Asset::Bitcoin => &self.bitcoin,
            Asset::Ethereum => &self.ethereum,
        }
    }

    pub fn combined(&self) -> CombinedReport {
        build_combined_report(&self.bitcoin, &self.ethereum)
    }

    /// True when at least one requested asset was fetched.
    pub fn has_data(&self) -> bool {
        let requested = Asset::ALL
            .iter()
            .filter(|asset| self.view.includes(**asset))
            .count();
        self.failures.len() < requested
    }
}

/// Rates to convert with, or the USD-only table when they cannot be fetched.
pub async fn fetch_rates_or_fallback(fx_provider: &(dyn FxRateProvider + Send + Sync)) -> FxRateTable {
    match fx_provider.fetch_rates().await {
        Ok(rates) => rates,
        Err(e) => {
            warn!(error = %e, "FX rates unavailable, falling back to USD only");
            FxRateTable::unavailable()
        }
    }
}

/// Payload for `asset`; `Ok(None)` if it was not requested.
async fn fetch_payload(
    treasury_provider: &(dyn TreasuryProvider + Send + Sync),
    asset: Asset,
    requested: bool,
) -> Result<Option<TreasuryPayload>, FetchFailure> {
    if !requested {
        return Ok(None);
    }
    match treasury_provider.fetch_treasury(asset).await {
        Ok(payload) => Ok(Some(payload)),
        Err(e) => {
            warn!(error = %e, "No treasury data for {}", asset);
            Err(FetchFailure {
                asset,
                message: e.to_string(),
            })
        }
    }
}

/// Fetches rates and the payloads `view` needs concurrently and builds their reports.
pub async fn fetch_holdings(
    treasury_provider: &(dyn TreasuryProvider + Send + Sync),
    fx_provider: &(dyn FxRateProvider + Send + Sync),
    view: AssetView,
) -> HoldingsData {
    let (rates, btc_payload, eth_payload) = futures::join!(
        fetch_rates_or_fallback(fx_provider),
        fetch_payload(treasury_provider, Asset::Bitcoin, view.includes(Asset::Bitcoin)),
        fetch_payload(treasury_provider, Asset::Ethereum, view.includes(Asset::Ethereum)),
    );

    let mut failures = Vec::new();
    let mut report_for = |asset: Asset, fetched: Result<Option<TreasuryPayload>, FetchFailure>| {
        let payload = fetched.unwrap_or_else(|failure| {
            failures.push(failure);
            None
        });
        let report = build_asset_report(asset, payload.as_ref());
        debug!("Built {} report with {} rows", asset, report.rows.len());
        report
    };
    let bitcoin = report_for(Asset::Bitcoin, btc_payload);
    let ethereum = report_for(Asset::Ethereum, eth_payload);

    HoldingsData {
        view,
        rates,
        bitcoin,
        ethereum,
        failures,
    }
}

pub fn failure_notice(failure: &FetchFailure) -> String {
    ui::style_text(
        &format!(
            "API Error: could not load {} treasury data ({})",
            failure.asset, failure.message
        ),
        ui::StyleType::Error,
    )
}

/// Text (or JSON) for the requested view.
pub fn render_holdings(data: &HoldingsData, options: &HoldingsOptions<'_>) -> Result<String> {
    let output = match options.view {
        AssetView::Bitcoin | AssetView::Ethereum => {
            let asset = if options.view == AssetView::Bitcoin {
                Asset::Bitcoin
            } else {
                Asset::Ethereum
            };
            let report = data.report(asset);
            if options.json {
                serde_json::to_string_pretty(report).context("Failed to serialize report")?
            } else {
                render_asset_report(report, options.currency, &data.rates, options.top_n)
            }
        }
        AssetView::Both => {
            let combined = data.combined();
            debug!("Built combined report with {} rows", combined.rows.len());
            if options.json {
                serde_json::to_string_pretty(&combined).context("Failed to serialize report")?
            } else {
                render_combined_report(&combined, options.currency, &data.rates, options.top_n)
            }
        }
    };
    Ok(output)
}

pub async fn run(
    treasury_provider: &(dyn TreasuryProvider + Send + Sync),
    fx_provider: &(dyn FxRateProvider + Send + Sync),
    options: &HoldingsOptions<'_>,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching treasury data...");
    let data = fetch_holdings(treasury_provider, fx_provider, options.view).await;
    pb.finish_and_clear();

    for failure in &data.failures {
        eprintln!("{}", failure_notice(failure));
    }

    if !data.has_data() {
        println!(
            "{}",
            ui::style_text(
                "No data available. Please check your API key or try again later.",
                ui::StyleType::Error
            )
        );
        return Ok(());
    }

    println!("{}", render_holdings(&data, options)?);
    Ok(())
}

pub fn render_asset_report(
    report: &AssetReport,
    currency: &str,
    rates: &FxRateTable,
    top_n: usize,
) -> String {
    let asset = report.asset;
    let code = asset.code();
    let stats = &report.stats;
    let money = |v: f64| format_currency(v, currency, rates);

    let mut output = format!(
        "{}\n\n",
        ui::style_text(&format!("{asset} Treasury Holdings"), ui::StyleType::Title)
    );

    let held_label = format!("Total {code} Held");
    let average_label = format!("Avg {code} / Company");
    output.push_str(&ui::metric_lines(&[
        (held_label.as_str(), format_quantity(stats.total_quantity, code)),
        ("Total Value", money(stats.total_value_usd)),
        (average_label.as_str(), format_count(stats.average_quantity_per_company)),
        ("Companies Tracked", stats.company_count.to_string()),
        ("Market Cap Dominance", format_percent(stats.supply_dominance_percent, 2)),
    ]));

    if let Some(reported) = report.reported_total_holdings {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Reported by source: {}", format_quantity(reported, code)),
                ui::StyleType::Subtle
            )
        ));
    }

    if report.is_empty() {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text("No companies reported.", ui::StyleType::Subtle)
        ));
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell("Country"),
        ui::header_cell("Total Holdings"),
        ui::header_cell(&format!("Entry Value ({currency})")),
        ui::header_cell(&format!("Current Value ({currency})")),
        ui::header_cell("PnL"),
        ui::header_cell("PnL %"),
        ui::header_cell("% of Total Supply"),
    ]);

    for row in &report.rows {
        let record = &row.record;
        table.add_row(vec![
            Cell::new(&record.name),
            Cell::new(&record.symbol),
            Cell::new(&record.country),
            ui::number_cell(format_count(record.holdings_quantity)),
            ui::number_cell(money(row.entry_value_usd())),
            ui::number_cell(money(row.current_value_usd())),
            ui::pnl_cell(money(row.pnl_usd), row.pnl_usd),
            ui::pnl_cell(format_percent(row.pnl_percent, 2), row.pnl_percent),
            ui::number_cell(format_percent(record.percent_of_supply.unwrap_or(0.0), 3)),
        ]);
    }

    output.push_str("\n\n");
    output.push_str(&table.to_string());

    output.push_str(&format!(
        "\n\n{}\n",
        ui::style_text(&format!("Share of {code} Supply"), ui::StyleType::MetricLabel)
    ));
    output.push_str(&format!(
        "Public Companies {} {}\nOthers           {} {}",
        ui::share_bar(stats.supply_share(), 30),
        format_percent(stats.supply_share(), 2),
        ui::share_bar(stats.others_share(), 30),
        format_percent(stats.others_share(), 2),
    ));

    let top = top_by_current_value(&report.rows, top_n);
    let mut top_table = ui::new_styled_table();
    top_table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Company"),
        ui::header_cell(&format!("Value ({currency})")),
    ]);
    for (rank, row) in top.iter().enumerate() {
        top_table.add_row(vec![
            ui::number_cell((rank + 1).to_string()),
            Cell::new(&row.record.name),
            ui::number_cell(money(row.current_value_usd())),
        ]);
    }
    output.push_str(&format!(
        "\n\n{}\n{}",
        ui::style_text(
            &format!("Top Public Companies Holding {code}"),
            ui::StyleType::MetricLabel
        ),
        top_table
    ));

    output
}

pub fn render_combined_report(
    report: &CombinedReport,
    currency: &str,
    rates: &FxRateTable,
    top_n: usize,
) -> String {
    let stats = &report.stats;
    let money = |v: f64| format_currency(v, currency, rates);
    let holders = |asset: Asset| {
        stats
            .totals_by_asset
            .get(&asset)
            .map_or(0, |t| t.holder_count)
    };

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Combined Treasury Holdings", ui::StyleType::Title)
    );

    output.push_str(&ui::metric_lines(&[
        ("Total BTC Held", format_quantity(stats.total_quantity(Asset::Bitcoin), "BTC")),
        ("Total ETH Held", format_quantity(stats.total_quantity(Asset::Ethereum), "ETH")),
        ("Total Entry Value", money(stats.total_entry_usd)),
        ("Total Current Value", money(stats.total_current_usd)),
        ("Total PnL", money(stats.total_pnl_usd)),
        ("Total PnL %", format_percent(stats.total_pnl_percent, 2)),
        ("Total Companies", stats.company_count.to_string()),
        (
            "BTC / ETH Companies",
            format!("{} / {}", holders(Asset::Bitcoin), holders(Asset::Ethereum)),
        ),
    ]));

    if report.rows.is_empty() {
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Company"),
        ui::header_cell("Symbol"),
        ui::header_cell("Country"),
        ui::header_cell("BTC Held"),
        ui::header_cell("Entry BTC"),
        ui::header_cell("Current BTC"),
        ui::header_cell("ETH Held"),
        ui::header_cell("Entry ETH"),
        ui::header_cell("Current ETH"),
        ui::header_cell("Total Entry"),
        ui::header_cell("Total Current"),
        ui::header_cell("PnL"),
        ui::header_cell("PnL %"),
    ]);

    for row in &report.rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.symbol),
            Cell::new(&row.country),
            ui::number_cell(format_quantity(row.bitcoin.quantity, "BTC")),
            ui::number_cell(money(row.bitcoin.entry_value_usd)),
            ui::number_cell(money(row.bitcoin.current_value_usd)),
            ui::number_cell(format_quantity(row.ethereum.quantity, "ETH")),
            ui::number_cell(money(row.ethereum.entry_value_usd)),
            ui::number_cell(money(row.ethereum.current_value_usd)),
            ui::number_cell(money(row.combined_entry_usd)),
            ui::number_cell(money(row.combined_current_usd)),
            ui::pnl_cell(money(row.combined_pnl_usd), row.combined_pnl_usd),
            ui::pnl_cell(
                format_percent(row.combined_pnl_percent, 2),
                row.combined_pnl_percent,
            ),
        ]);
    }
    output.push_str("\n\n");
    output.push_str(&table.to_string());

    let mut top_table = ui::new_styled_table();
    top_table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Company"),
        ui::header_cell(&format!("Total Value ({currency})")),
    ]);
    for (rank, row) in top_combined_by_current_value(&report.rows, top_n)
        .iter()
        .enumerate()
    {
        top_table.add_row(vec![
            ui::number_cell((rank + 1).to_string()),
            Cell::new(&row.name),
            ui::number_cell(money(row.combined_current_usd)),
        ]);
    }
    output.push_str(&format!(
        "\n\n{}\n{}",
        ui::style_text(
            &format!("Top {top_n} Companies by Total Value"),
            ui::StyleType::MetricLabel
        ),
        top_table
    ));

    output.push_str(&format!(
        "\n\n{}",
        ui::style_text("Asset Distribution by Value", ui::StyleType::MetricLabel)
    ));
    for (asset, share) in stats.asset_distribution() {
        output.push_str(&format!(
            "\n{:<9}{} {}",
            asset.to_string(),
            ui::share_bar(share, 30),
            format_percent(share, 2)
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    fn btc_payload() -> TreasuryPayload {
        TreasuryPayload::from_value(json!({
            "companies": [
                {
                    "name": "Alpha Corp",
                    "symbol": "ALP",
                    "country": "US",
                    "total_holdings": 1000,
                    "total_entry_value_usd": 30_000_000,
                    "total_current_value_usd": 50_000_000,
                    "percentage_of_total_supply": 0.005
                },
                {
                    "name": "Beta Inc",
                    "symbol": "BET",
                    "country": "CA",
                    "total_holdings": 500,
                    "total_entry_value_usd": 20_000_000,
                    "total_current_value_usd": 10_000_000
                }
            ]
        }))
    }

    struct MockTreasuryProvider;

    #[async_trait]
    impl TreasuryProvider for MockTreasuryProvider {
        async fn fetch_treasury(&self, asset: Asset) -> Result<TreasuryPayload> {
            match asset {
                Asset::Bitcoin => Ok(btc_payload()),
                Asset::Ethereum => Err(anyhow!("Service unavailable")),
            }
        }
    }

    struct FailingFxProvider;

    #[async_trait]
    impl FxRateProvider for FailingFxProvider {
        async fn fetch_rates(&self) -> Result<FxRateTable> {
            Err(anyhow!("Rate service unavailable"))
        }
    }

    #[test]
    fn test_asset_view_includes() {
        assert!(AssetView::Both.includes(Asset::Ethereum));
        assert!(AssetView::Bitcoin.includes(Asset::Bitcoin));
        assert!(!AssetView::Bitcoin.includes(Asset::Ethereum));
    }

    #[test]
    fn test_render_asset_report() {
        let report = build_asset_report(Asset::Bitcoin, Some(&btc_payload()));
        let rates = FxRateTable::unavailable();
        let output = render_asset_report(&report, "USD", &rates, 10);

        assert!(output.contains("Bitcoin Treasury Holdings"));
        assert!(output.contains("1,500 BTC"));
        assert!(output.contains("$60.00M"));
        assert!(output.contains("Alpha Corp"));
        assert!(output.contains("$50.00M"));
        assert!(output.contains("66.67%"));
        assert!(output.contains("-50.00%"));
        assert!(output.contains("0.005%"));
        assert!(output.contains("Top Public Companies Holding BTC"));
    }

    #[test]
    fn test_render_converts_currency() {
        let report = build_asset_report(Asset::Bitcoin, Some(&btc_payload()));
        let rates = FxRateTable::from_usd_rates(vec![("EUR", 0.5)]);
        let output = render_asset_report(&report, "EUR", &rates, 10);

        assert!(output.contains("€25.00M"));
        assert!(output.contains("Current Value (EUR)"));
    }

    #[test]
    fn test_render_empty_asset_report() {
        let report = build_asset_report(Asset::Ethereum, None);
        let output = render_asset_report(&report, "USD", &FxRateTable::unavailable(), 10);

        assert!(output.contains("Ethereum Treasury Holdings"));
        assert!(output.contains("No companies reported."));
    }

    #[test]
    fn test_render_combined_report() {
        let btc = build_asset_report(Asset::Bitcoin, Some(&btc_payload()));
        let eth = build_asset_report(Asset::Ethereum, None);
        let combined = build_combined_report(&btc, &eth);
        let output = render_combined_report(&combined, "USD", &FxRateTable::unavailable(), 10);

        assert!(output.contains("Combined Treasury Holdings"));
        assert!(output.contains("2 / 0"));
        assert!(output.contains("Asset Distribution by Value"));
        assert!(output.contains("100.00%"));
    }

    #[tokio::test]
    async fn test_rates_fallback_on_failure() {
        let rates = fetch_rates_or_fallback(&FailingFxProvider).await;
        assert_eq!(rates, FxRateTable::unavailable());
    }

    #[tokio::test]
    async fn test_run_tolerates_failed_asset() {
        let options = HoldingsOptions {
            view: AssetView::Both,
            currency: "USD",
            top_n: 5,
            json: false,
        };
        let result = run(&MockTreasuryProvider, &FailingFxProvider, &options).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_json_output() {
        let options = HoldingsOptions {
            view: AssetView::Bitcoin,
            currency: "USD",
            top_n: 5,
            json: true,
        };
        let result = run(&MockTreasuryProvider, &FailingFxProvider, &options).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_holdings_records_failed_asset() {
        let data = fetch_holdings(&MockTreasuryProvider, &FailingFxProvider, AssetView::Both).await;

        assert!(data.has_data());
        assert_eq!(data.bitcoin.rows.len(), 2);
        assert!(data.ethereum.is_empty());
        assert_eq!(data.failures.len(), 1);
        assert_eq!(data.failures[0].asset, Asset::Ethereum);
        assert_eq!(data.rates, FxRateTable::unavailable());

        let notice = failure_notice(&data.failures[0]);
        assert!(notice.contains("API Error"));
        assert!(notice.contains("Ethereum"));
        assert!(notice.contains("Service unavailable"));
    }

    #[tokio::test]
    async fn test_fetch_holdings_without_data() {
        let data = fetch_holdings(&MockTreasuryProvider, &FailingFxProvider, AssetView::Ethereum).await;
        assert!(!data.has_data());

        // Bitcoin is not requested for this view, so it is neither fetched nor failed
        assert!(data.bitcoin.is_empty());
        assert_eq!(data.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_render_holdings_json() {
        let data = fetch_holdings(&MockTreasuryProvider, &FailingFxProvider, AssetView::Both).await;
        let options = HoldingsOptions {
            view: AssetView::Both,
            currency: "USD",
            top_n: 5,
            json: true,
        };

        let json: serde_json::Value =
            serde_json::from_str(&render_holdings(&data, &options).unwrap()).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["stats"]["total_current_usd"], 60_000_000.0);
        assert_eq!(json["stats"]["company_count"], 2);
    }
}
