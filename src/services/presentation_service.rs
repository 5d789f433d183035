use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{AlertType, AlertView, WatchlistEntry};

/// Live quote for one symbol. `c` is the current price and `dp` the daily
/// change in percent, matching the market-data provider's field names.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub c: Option<f64>,
    pub dp: Option<f64>,
}

pub type QuoteMap = HashMap<String, Quote>;

/// Market-data provider seam. Implementations live outside this crate.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quotes(&self, symbols: &[String]) -> QuoteMap;
}

/// Source used when no provider is configured: every price renders as "—".
pub struct NoQuotes;

#[async_trait]
impl QuoteSource for NoQuotes {
    async fn quotes(&self, _symbols: &[String]) -> QuoteMap {
        QuoteMap::new()
    }
}

/// Fixed quotes, handy for demos and tests.
pub struct StaticQuotes(pub QuoteMap);

#[async_trait]
impl QuoteSource for StaticQuotes {
    async fn quotes(&self, symbols: &[String]) -> QuoteMap {
        symbols
            .iter()
            .filter_map(|s| self.0.get(s).map(|q| (s.clone(), *q)))
            .collect()
    }
}

/// One article of the watchlist news feed. `datetime` is unix seconds, as
/// the news provider reports it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub category: String,
    pub datetime: i64,
}

/// News provider seam, shaped like [`QuoteSource`]. Errors are plain
/// strings; the caller logs them and shows an empty feed.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn news(&self, symbols: &[String]) -> Result<Vec<NewsArticle>, String>;
}

pub struct NoNews;

#[async_trait]
impl NewsSource for NoNews {
    async fn news(&self, _symbols: &[String]) -> Result<Vec<NewsArticle>, String> {
        Ok(vec![])
    }
}

/// Fixed articles; `related` lists the symbols each article is about.
pub struct StaticNews(pub Vec<(Vec<String>, NewsArticle)>);

#[async_trait]
impl NewsSource for StaticNews {
    async fn news(&self, symbols: &[String]) -> Result<Vec<NewsArticle>, String> {
        Ok(self
            .0
            .iter()
            .filter(|(related, _)| related.iter().any(|r| symbols.contains(r)))
            .map(|(_, article)| article.clone())
            .collect())
    }
}

/// News for the watchlist symbols (alert symbols are not included). Any
/// provider failure yields an empty feed.
pub async fn fetch_news(source: &dyn NewsSource, entries: &[WatchlistEntry]) -> Vec<NewsArticle> {
    let symbols: Vec<String> = entries.iter().map(|e| e.symbol.clone()).collect();

    match source.news(&symbols).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(error = %e, "watchlist news unavailable");
            vec![]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRow {
    pub user_id: String,
    pub symbol: String,
    pub company: String,
    pub added_at: i64,
    pub added_label: String,
    pub current_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub price_formatted: String,
    pub change_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    pub id: String,
    pub symbol: String,
    pub company: String,
    pub alert_name: String,
    pub alert_type: AlertType,
    pub threshold: f64,
    pub threshold_formatted: String,
    pub current_price: Option<f64>,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistOption {
    pub symbol: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistOverview {
    pub items: Vec<WatchlistRow>,
    pub alerts: Vec<AlertRow>,
    pub watchlist_options: Vec<WatchlistOption>,
    pub news: Vec<NewsArticle>,
}

const MISSING: &str = "—";

pub fn format_price(price: f64) -> String {
    let cents = (price.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

pub fn format_change_percent(pct: f64) -> String {
    let sign = if pct > 0.0 { "+" } else { "" };
    format!("{sign}{pct:.2}%")
}

fn added_label(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_default()
}

/// Distinct symbols across watchlist and alerts, for one quote request.
pub fn quote_symbols(entries: &[WatchlistEntry], alerts: &[AlertView]) -> Vec<String> {
    let set: BTreeSet<&str> = entries
        .iter()
        .map(|e| e.symbol.as_str())
        .chain(alerts.iter().map(|a| a.symbol.as_str()))
        .collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn watchlist_rows(entries: &[WatchlistEntry], quotes: &QuoteMap) -> Vec<WatchlistRow> {
    entries
        .iter()
        .map(|e| {
            let quote = quotes.get(&e.symbol).copied().unwrap_or_default();
            let price = quote.c.filter(|p| p.is_finite());
            let change = quote.dp.filter(|p| p.is_finite());

            WatchlistRow {
                user_id: e.owner_id.clone(),
                symbol: e.symbol.clone(),
                company: e.company.clone(),
                added_at: e.added_at,
                added_label: added_label(e.added_at),
                current_price: price,
                change_percent: change,
                price_formatted: price.map(format_price).unwrap_or_else(|| MISSING.to_string()),
                change_formatted: change
                    .map(format_change_percent)
                    .unwrap_or_else(|| MISSING.to_string()),
            }
        })
        .collect()
}

pub fn alert_rows(alerts: &[AlertView], quotes: &QuoteMap) -> Vec<AlertRow> {
    alerts
        .iter()
        .map(|a| {
            let quote = quotes.get(&a.symbol).copied().unwrap_or_default();
            AlertRow {
                id: a.id.clone(),
                symbol: a.symbol.clone(),
                company: a.company.clone(),
                alert_name: a.alert_name.clone(),
                alert_type: a.alert_type,
                threshold: a.threshold,
                threshold_formatted: format_price(a.threshold),
                current_price: quote.c.filter(|p| p.is_finite()),
                change_percent: quote.dp.filter(|p| p.is_finite()),
            }
        })
        .collect()
}

pub fn watchlist_options(entries: &[WatchlistEntry]) -> Vec<WatchlistOption> {
    entries
        .iter()
        .map(|e| WatchlistOption {
            symbol: e.symbol.clone(),
            company: e.company.clone(),
        })
        .collect()
}

pub fn assemble(
    entries: &[WatchlistEntry],
    alerts: &[AlertView],
    quotes: &QuoteMap,
    news: Vec<NewsArticle>,
) -> WatchlistOverview {
    WatchlistOverview {
        items: watchlist_rows(entries, quotes),
        alerts: alert_rows(alerts, quotes),
        watchlist_options: watchlist_options(entries),
        news,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, added_at: i64) -> WatchlistEntry {
        WatchlistEntry {
            owner_id: "u1".into(),
            symbol: symbol.into(),
            company: format!("{symbol} Corp"),
            added_at,
        }
    }

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(0.0), "$0.00");
        assert_eq!(format_price(250.5), "$250.50");
        assert_eq!(format_price(1234567.891), "$1,234,567.89");
        assert_eq!(format_price(-12.3), "-$12.30");
        assert_eq!(format_change_percent(1.234), "+1.23%");
        assert_eq!(format_change_percent(-0.5), "-0.50%");
        assert_eq!(format_change_percent(0.0), "0.00%");
    }

    #[test]
    fn rows_without_quotes_render_placeholders() {
        // 2026-01-05T00:00:00Z
        let rows = watchlist_rows(&[entry("AAPL", 1_767_571_200_000)], &QuoteMap::new());
        assert_eq!(rows[0].price_formatted, "—");
        assert_eq!(rows[0].change_formatted, "—");
        assert_eq!(rows[0].current_price, None);
        assert_eq!(rows[0].added_label, "Jan 05, 2026");
    }

    #[test]
    fn rows_pick_up_quotes_by_symbol() {
        let mut quotes = QuoteMap::new();
        quotes.insert("MSFT".into(), Quote { c: Some(410.0), dp: Some(-1.5) });

        let rows = watchlist_rows(&[entry("MSFT", 0), entry("AAPL", 0)], &quotes);
        assert_eq!(rows[0].price_formatted, "$410.00");
        assert_eq!(rows[0].change_formatted, "-1.50%");
        assert_eq!(rows[1].price_formatted, "—");
    }

    struct BrokenNews;

    #[async_trait]
    impl NewsSource for BrokenNews {
        async fn news(&self, _symbols: &[String]) -> Result<Vec<NewsArticle>, String> {
            Err("provider down".to_string())
        }
    }

    fn article(id: i64, headline: &str) -> NewsArticle {
        NewsArticle {
            id,
            headline: headline.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn news_uses_watchlist_symbols_only() {
        let source = StaticNews(vec![
            (vec!["AAPL".into()], article(1, "Apple ships")),
            (vec!["TSLA".into()], article(2, "Tesla recalls")),
        ]);

        let news = fetch_news(&source, &[entry("AAPL", 0)]).await;
        assert_eq!(news, vec![article(1, "Apple ships")]);
    }

    #[tokio::test]
    async fn failed_news_fetch_is_empty() {
        assert!(fetch_news(&BrokenNews, &[entry("AAPL", 0)]).await.is_empty());
        assert!(fetch_news(&NoNews, &[entry("AAPL", 0)]).await.is_empty());
    }

    #[test]
    fn quote_symbols_are_deduplicated() {
        let alerts = vec![AlertView {
            id: "x".into(),
            symbol: "TSLA".into(),
            company: "Tesla".into(),
            alert_name: "n".into(),
            alert_type: AlertType::Below,
            threshold: 1.0,
        }];
        let syms = quote_symbols(&[entry("TSLA", 0), entry("AAPL", 0)], &alerts);
        assert_eq!(syms, vec!["AAPL".to_string(), "TSLA".to_string()]);
    }
}
