//! Marine forecast tool backed by NDBC real-time buoy observations.
//!
//! The feed is plain text: two header lines followed by one observation per
//! line, newest first. Columns are whitespace separated and missing values are
//! written as `MM`.

use super::{Tool, ToolDeclaration};
use crate::config::ForecastSettings;
use crate::error::{Result, SwellError, ToolExecutionError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Name under which the tool is exposed to the model.
pub const TOOL_NAME: &str = "get_marine_forecast";

/// Token the feed uses for a missing value.
const MISSING: &str = "MM";

const FEET_PER_METER: f64 = 3.28084;

/// Header lines at the top of every feed.
const HEADER_LINES: usize = 2;

/// Zero-based column of the significant wave height (metres).
const WAVE_HEIGHT_COLUMN: usize = 8;

/// Zero-based column of the dominant wave period (seconds).
const WAVE_PERIOD_COLUMN: usize = 9;

/// What to do when a feed contains no row with both wave fields present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Answer with a zero reading ("0 feet with period of 0 seconds").
    #[default]
    ZeroFill,
    /// Fail the call with `NoValidObservation`.
    Report,
}

impl std::str::FromStr for MissingDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero_fill" | "zero-fill" | "zero" => Ok(MissingDataPolicy::ZeroFill),
            "report" | "error" => Ok(MissingDataPolicy::Report),
            _ => Err(format!("Unknown missing data policy: {}", s)),
        }
    }
}

impl std::fmt::Display for MissingDataPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingDataPolicy::ZeroFill => write!(f, "zero_fill"),
            MissingDataPolicy::Report => write!(f, "report"),
        }
    }
}

/// Wave conditions from a single observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MarineForecast {
    /// Wave height in whole feet.
    pub wave_height: u32,
    /// Wave period in seconds, exactly as the feed reported it.
    pub wave_period: String,
    /// When the observation was taken, if the row's timestamp parsed.
    pub observed_at: Option<DateTime<Utc>>,
}

impl Default for MarineForecast {
    fn default() -> Self {
        Self {
            wave_height: 0,
            wave_period: "0".to_string(),
            observed_at: None,
        }
    }
}

impl std::fmt::Display for MarineForecast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The waves are {} feet with period of {} seconds.",
            self.wave_height, self.wave_period
        )
    }
}

/// Outcome of scanning a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedReading {
    /// The first row with both wave fields present.
    Observation(MarineForecast),
    /// Every data row was missing a wave field, or there were no data rows.
    NoValidObservation,
}

/// Scan a feed body and return its most recent valid observation.
pub fn parse_feed(body: &str) -> std::result::Result<FeedReading, ToolExecutionError> {
    for (line_no, line) in body.lines().enumerate().skip(HEADER_LINES) {
        // Only the first comma-separated cell carries data.
        let cell = line.split(',').next().unwrap_or_default();
        let fields: Vec<&str> = cell.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() <= WAVE_PERIOD_COLUMN {
            return Err(ToolExecutionError::MalformedResponse(format!(
                "line {} has {} columns, expected at least {}",
                line_no + 1,
                fields.len(),
                WAVE_PERIOD_COLUMN + 1
            )));
        }

        let height = fields[WAVE_HEIGHT_COLUMN];
        let period = fields[WAVE_PERIOD_COLUMN];
        if height == MISSING || period == MISSING {
            continue;
        }

        let meters = parse_measurement(height, "wave height", line_no)?;
        parse_measurement(period, "wave period", line_no)?;

        return Ok(FeedReading::Observation(MarineForecast {
            wave_height: (meters * FEET_PER_METER).round_ties_even() as u32,
            wave_period: period.to_string(),
            observed_at: parse_timestamp(&fields),
        }));
    }

    Ok(FeedReading::NoValidObservation)
}

fn parse_measurement(
    raw: &str,
    what: &str,
    line_no: usize,
) -> std::result::Result<f64, ToolExecutionError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ToolExecutionError::MalformedResponse(format!(
            "line {} has invalid {} '{}'",
            line_no + 1,
            what,
            raw
        ))),
    }
}

/// Rows start with `YYYY MM DD hh mm` in UTC.
fn parse_timestamp(fields: &[&str]) -> Option<DateTime<Utc>> {
    let num = |i: usize| fields.get(i)?.parse::<u32>().ok();
    let year = fields.first()?.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, num(1)?, num(2)?)?
        .and_hms_opt(num(3)?, num(4)?, 0)
        .map(|dt| dt.and_utc())
}

/// Fetches the latest wave height and period for a buoy.
pub struct MarineForecastTool {
    declaration: ToolDeclaration,
    client: reqwest::Client,
    base_url: Url,
    missing_data: MissingDataPolicy,
}

impl MarineForecastTool {
    /// Create the tool against the given feed host.
    pub fn new(base_url: &str, timeout: Duration, missing_data: MissingDataPolicy) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| SwellError::Config(format!("Invalid forecast base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwellError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            declaration: declaration(),
            client,
            base_url,
            missing_data,
        })
    }

    /// Create the tool from configuration.
    pub fn from_settings(settings: &ForecastSettings) -> Result<Self> {
        Self::new(
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
            settings.missing_data,
        )
    }

    /// URL of the real-time feed for a buoy.
    pub fn feed_url(&self, buoy_id: &str) -> std::result::Result<Url, ToolExecutionError> {
        self.base_url
            .join(&format!("data/realtime2/{}.txt", buoy_id))
            .map_err(|e| ToolExecutionError::InvalidUrl(e.to_string()))
    }

    /// Fetch and parse the feed for a buoy.
    #[instrument(skip(self))]
    pub async fn forecast(&self, buoy_id: &str) -> std::result::Result<FeedReading, ToolExecutionError> {
        validate_buoy_id(buoy_id)?;
        let body = self.fetch(buoy_id).await?;
        parse_feed(&body)
    }

    async fn fetch(&self, buoy_id: &str) -> std::result::Result<String, ToolExecutionError> {
        let url = self.feed_url(buoy_id)?;
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolExecutionError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_request_error(e, &url))
    }
}

#[async_trait]
impl Tool for MarineForecastTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn execute(
        &self,
        arguments: &serde_json::Value,
    ) -> std::result::Result<String, ToolExecutionError> {
        let buoy_id = arguments["buoy_id"]
            .as_str()
            .ok_or_else(|| ToolExecutionError::InvalidArguments("Missing 'buoy_id' argument".to_string()))?
            .trim();

        match self.forecast(buoy_id).await? {
            FeedReading::Observation(forecast) => {
                info!(
                    buoy_id,
                    observed_at = ?forecast.observed_at,
                    "Wave height {} ft, period {} s",
                    forecast.wave_height,
                    forecast.wave_period
                );
                Ok(forecast.to_string())
            }
            FeedReading::NoValidObservation => match self.missing_data {
                MissingDataPolicy::ZeroFill => {
                    warn!(buoy_id, "No valid observation in feed, reporting a zero reading");
                    Ok(MarineForecast::default().to_string())
                }
                MissingDataPolicy::Report => {
                    Err(ToolExecutionError::NoValidObservation(buoy_id.to_string()))
                }
            },
        }
    }
}

fn declaration() -> ToolDeclaration {
    ToolDeclaration {
        name: TOOL_NAME.to_string(),
        description: "Get the latest marine conditions offshore at a buoy from the US National \
            Data Buoy Center. Returns the wave height in feet and the wave period in seconds."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "buoy_id": {
                    "type": "string",
                    "description": "The NDBC buoy id to read, e.g. 46214"
                }
            },
            "required": ["buoy_id"]
        }),
    }
}

fn validate_buoy_id(buoy_id: &str) -> std::result::Result<(), ToolExecutionError> {
    if buoy_id.is_empty() || !buoy_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ToolExecutionError::InvalidArguments(format!(
            "Invalid buoy id '{}'",
            buoy_id
        )));
    }
    Ok(())
}

fn classify_request_error(err: reqwest::Error, url: &Url) -> ToolExecutionError {
    let detail = format!("{}: {}", url, root_cause(&err));
    if err.is_timeout() {
        ToolExecutionError::Timeout(detail)
    } else if is_tls_error(&err) {
        ToolExecutionError::Tls(detail)
    } else if err.is_connect() {
        ToolExecutionError::Unreachable(detail)
    } else {
        ToolExecutionError::Network(detail)
    }
}

fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Whether the source chain holds a rustls failure.
///
/// The TLS stream reports handshake and record errors as `io::Error`s of kind
/// `InvalidData` wrapping the `rustls::Error`, and `io::Error::source` skips
/// the wrapped value, so it is inspected through `get_ref`.
fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return true;
            }
            if err.is_connect() && io.kind() == std::io::ErrorKind::InvalidData {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use serde_json::json;

    const HEADER: &str = "#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE\n\
                          #yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft\n";

    fn feed(rows: &[&str]) -> String {
        format!("{}{}\n", HEADER, rows.join("\n"))
    }

    fn reading(body: &str) -> FeedReading {
        parse_feed(body).unwrap()
    }

    #[test]
    fn test_single_valid_row() {
        let body = feed(&["2024 06 01 12 30 270 5.0 6.0 1.0 10 6.1 280 1015.0 15.0 16.0 MM MM MM MM"]);
        let FeedReading::Observation(forecast) = reading(&body) else {
            panic!("Expected an observation");
        };
        assert_eq!(
            forecast.to_string(),
            "The waves are 3 feet with period of 10 seconds."
        );
        assert_eq!(
            forecast.observed_at.map(|t| t.to_rfc3339()),
            Some("2024-06-01T12:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_skips_rows_before_first_valid() {
        let body = feed(&[
            "2024 06 01 13 00 270 5.0 6.0 MM 12 MM 280 1015.0 15.0 16.0 MM MM MM MM",
            "2024 06 01 12 30 270 5.0 6.0 2.0 14 6.1 280 1015.0 15.0 16.0 MM MM MM MM",
            "2024 06 01 12 00 270 5.0 6.0 9.0 20 6.1 280 1015.0 15.0 16.0 MM MM MM MM",
        ]);
        let FeedReading::Observation(forecast) = reading(&body) else {
            panic!("Expected an observation");
        };
        assert_eq!(forecast.wave_height, 7);
        assert_eq!(forecast.wave_period, "14");
    }

    #[test]
    fn test_period_passes_through_unrounded() {
        let body = feed(&["2024 06 01 12 30 270 5.0 6.0 0.5 9.7 6.1 280 1015.0 15.0 16.0 MM MM MM MM"]);
        let FeedReading::Observation(forecast) = reading(&body) else {
            panic!("Expected an observation");
        };
        assert_eq!(
            forecast.to_string(),
            "The waves are 2 feet with period of 9.7 seconds."
        );
    }

    #[test]
    fn test_all_missing_rows() {
        let body = feed(&[
            "2024 06 01 13 00 270 5.0 6.0 MM 12 MM 280 1015.0 15.0 16.0 MM MM MM MM",
            "2024 06 01 12 30 270 5.0 6.0 1.2 MM MM 280 1015.0 15.0 16.0 MM MM MM MM",
        ]);
        assert_eq!(reading(&body), FeedReading::NoValidObservation);
    }

    #[test]
    fn test_headers_only() {
        assert_eq!(reading(HEADER), FeedReading::NoValidObservation);
        assert_eq!(reading(""), FeedReading::NoValidObservation);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let body = feed(&["2024 06 01 12 30 270 5.0"]);
        assert!(matches!(
            parse_feed(&body),
            Err(ToolExecutionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_numeric_height_is_malformed() {
        let body = feed(&["2024 06 01 12 30 270 5.0 6.0 abc 10 6.1 280 1015.0 15.0 16.0 MM MM MM MM"]);
        assert!(matches!(
            parse_feed(&body),
            Err(ToolExecutionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_feed_url() {
        let tool = MarineForecastTool::new(
            "https://www.ndbc.noaa.gov",
            Duration::from_secs(5),
            MissingDataPolicy::ZeroFill,
        )
        .unwrap();
        assert_eq!(
            tool.feed_url("46214").unwrap().as_str(),
            "https://www.ndbc.noaa.gov/data/realtime2/46214.txt"
        );
    }

    #[test]
    fn test_missing_data_policy_from_str() {
        assert_eq!("report".parse::<MissingDataPolicy>(), Ok(MissingDataPolicy::Report));
        assert_eq!("zero-fill".parse::<MissingDataPolicy>(), Ok(MissingDataPolicy::ZeroFill));
        assert!("maybe".parse::<MissingDataPolicy>().is_err());
    }

    /// Serve `body` at the feed path for buoy 46214 on a local port.
    async fn serve_feed(body: String) -> String {
        let app = Router::new().route(
            "/data/realtime2/46214.txt",
            get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn tool(base_url: &str, policy: MissingDataPolicy) -> MarineForecastTool {
        MarineForecastTool::new(base_url, Duration::from_secs(5), policy).unwrap()
    }

    #[tokio::test]
    async fn test_execute_against_feed() {
        let base = serve_feed(feed(&[
            "2024 06 01 13 00 270 5.0 6.0 MM 12 MM 280 1015.0 15.0 16.0 MM MM MM MM",
            "2024 06 01 12 30 270 5.0 6.0 1.0 10 6.1 280 1015.0 15.0 16.0 MM MM MM MM",
        ]))
        .await;
        let tool = tool(&base, MissingDataPolicy::ZeroFill);
        let args = json!({"buoy_id": "46214"});

        let first = tool.execute(&args).await.unwrap();
        let second = tool.execute(&args).await.unwrap();
        assert_eq!(first, "The waves are 3 feet with period of 10 seconds.");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_data_policies() {
        let base = serve_feed(feed(&[
            "2024 06 01 13 00 270 5.0 6.0 MM MM MM 280 1015.0 15.0 16.0 MM MM MM MM",
        ]))
        .await;
        let args = json!({"buoy_id": "46214"});

        let zero = tool(&base, MissingDataPolicy::ZeroFill).execute(&args).await.unwrap();
        assert_eq!(zero, "The waves are 0 feet with period of 0 seconds.");

        let report = tool(&base, MissingDataPolicy::Report).execute(&args).await;
        assert!(matches!(
            report,
            Err(ToolExecutionError::NoValidObservation(id)) if id == "46214"
        ));
    }

    #[tokio::test]
    async fn test_unknown_buoy_is_http_status() {
        let base = serve_feed(feed(&[])).await;
        let result = tool(&base, MissingDataPolicy::ZeroFill)
            .execute(&json!({"buoy_id": "99999"}))
            .await;
        assert!(matches!(
            result,
            Err(ToolExecutionError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let result = tool("http://127.0.0.1:1", MissingDataPolicy::ZeroFill)
            .execute(&json!({"buoy_id": "46214"}))
            .await;
        assert!(matches!(result, Err(ToolExecutionError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_tls() {
        let result = tool("http://127.0.0.1:1", MissingDataPolicy::ZeroFill)
            .execute(&json!({"buoy_id": "tls01"}))
            .await;
        assert!(matches!(result, Err(ToolExecutionError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_tls_failure() {
        let base = serve_feed(feed(&[])).await;
        let https = base.replacen("http://", "https://", 1);

        let result = tool(&https, MissingDataPolicy::ZeroFill)
            .execute(&json!({"buoy_id": "46214"}))
            .await;
        assert!(matches!(result, Err(ToolExecutionError::Tls(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_slow_feed_times_out() {
        let app = Router::new().route(
            "/data/realtime2/46214.txt",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                String::new()
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let tool = MarineForecastTool::new(
            &format!("http://{}", addr),
            Duration::from_millis(100),
            MissingDataPolicy::ZeroFill,
        )
        .unwrap();
        let result = tool.execute(&json!({"buoy_id": "46214"})).await;
        assert!(matches!(result, Err(ToolExecutionError::Timeout(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let tool = tool("http://127.0.0.1:1", MissingDataPolicy::ZeroFill);

        let missing = tool.execute(&json!({})).await;
        assert!(matches!(missing, Err(ToolExecutionError::InvalidArguments(_))));

        let traversal = tool.execute(&json!({"buoy_id": "../secrets"})).await;
        assert!(matches!(traversal, Err(ToolExecutionError::InvalidArguments(_))));
    }
}
