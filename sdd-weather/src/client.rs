use crate::cache::{CacheKey, CachePolicy, CachedResponse, ResponseCache};
use crate::error::{Result, WeatherError};
use crate::hourly::HourlyWeatherSeries;
use crate::parameter::{Mode, Parameter};
use chrono::{NaiveDate, TimeDelta, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use std::time::Duration;

/// Open-Meteo historical archive endpoint.
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Open-Meteo forecast endpoint.
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Longest horizon the forecast endpoint serves.
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Query date format: "YYYY-MM-DD"
const YEAR_FORMAT: &str = "%Y-%m-%d";

/// Location, endpoints and retry budget for [`WeatherClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone name passed to the API; responses are returned in it.
    pub timezone: String,
    pub archive_url: String,
    pub forecast_url: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub initial_backoff: Duration,
    pub request_timeout: Duration,
    /// Lifetime of cached forecast responses.
    pub forecast_ttl: TimeDelta,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            latitude: 52.374,
            longitude: 4.890,
            timezone: "Europe/Berlin".to_string(),
            archive_url: ARCHIVE_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
            max_retries: 5,
            initial_backoff: Duration::from_millis(200),
            request_timeout: Duration::from_secs(30),
            forecast_ttl: TimeDelta::minutes(60),
        }
    }
}

/// Which slice of time a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Dates { start: NaiveDate, end: NaiveDate },
    Days { past_days: u32, forecast_days: u32 },
}

/// A fully resolved request: endpoint, ordered query and cache identity.
#[derive(Debug, Clone)]
struct SeriesQuery {
    url: String,
    pairs: Vec<(&'static str, String)>,
    key: CacheKey,
    policy: CachePolicy,
}

/// Client for the Open-Meteo archive and forecast APIs.
pub struct WeatherClient {
    http: Client,
    config: ClientConfig,
    cache: Option<Box<dyn ResponseCache>>,
}

impl WeatherClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config,
            cache: None,
        })
    }

    /// Serve repeated requests from `cache` according to each request's policy.
    pub fn with_cache(mut self, cache: Box<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch hourly `parameters` for `start..=end` from the endpoint for `mode`.
    pub async fn fetch_series(
        &self,
        parameters: &[Parameter],
        start: NaiveDate,
        end: NaiveDate,
        mode: Mode,
    ) -> Result<HourlyWeatherSeries> {
        validate_parameters(parameters, mode)?;
        if start > end {
            return Err(WeatherError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let query = self.series_query(parameters, mode, Window::Dates { start, end });
        self.fetch_query(&query, parameters).await
    }

    /// Fetch settled observations from the archive.
    pub async fn fetch_historical(
        &self,
        parameters: &[Parameter],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HourlyWeatherSeries> {
        self.fetch_series(parameters, start, end, Mode::Historical)
            .await
    }

    /// Fetch the forecast starting `past_days` before today and reaching
    /// `forecast_days` ahead (today included).
    pub async fn fetch_forecast(
        &self,
        parameters: &[Parameter],
        past_days: u32,
        forecast_days: u32,
    ) -> Result<HourlyWeatherSeries> {
        validate_parameters(parameters, Mode::Forecast)?;
        if forecast_days == 0 || forecast_days > MAX_FORECAST_DAYS {
            return Err(WeatherError::InvalidRequest(format!(
                "forecast_days must be in 1..={MAX_FORECAST_DAYS}, got {forecast_days}"
            )));
        }
        let query = self.series_query(
            parameters,
            Mode::Forecast,
            Window::Days {
                past_days,
                forecast_days,
            },
        );
        self.fetch_query(&query, parameters).await
    }

    fn series_query(&self, parameters: &[Parameter], mode: Mode, window: Window) -> SeriesQuery {
        let today = Utc::now().date_naive();
        let url = match mode {
            Mode::Historical => self.config.archive_url.clone(),
            Mode::Forecast => self.config.forecast_url.clone(),
        };
        let hourly = parameters
            .iter()
            .map(Parameter::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let mut pairs: Vec<(&'static str, String)> = vec![
            ("latitude", self.config.latitude.to_string()),
            ("longitude", self.config.longitude.to_string()),
            ("hourly", hourly),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", self.config.timezone.clone()),
            ("timeformat", "unixtime".to_string()),
        ];
        let end_date = match window {
            Window::Dates { start, end } => {
                pairs.push(("start_date", start.format(YEAR_FORMAT).to_string()));
                pairs.push(("end_date", end.format(YEAR_FORMAT).to_string()));
                end
            }
            Window::Days {
                past_days,
                forecast_days,
            } => {
                pairs.push(("past_days", past_days.to_string()));
                pairs.push(("forecast_days", forecast_days.to_string()));
                today + TimeDelta::days(i64::from(forecast_days))
            }
        };

        // The issue date keeps forecasts from different days apart even
        // before their TTL runs out.
        let mut key_pairs = pairs.clone();
        if mode == Mode::Forecast {
            key_pairs.push(("issued", today.format(YEAR_FORMAT).to_string()));
        }
        SeriesQuery {
            key: CacheKey::new(&url, &key_pairs),
            policy: CachePolicy::for_request(mode, end_date, today, self.config.forecast_ttl),
            url,
            pairs,
        }
    }

    async fn fetch_query(
        &self,
        query: &SeriesQuery,
        parameters: &[Parameter],
    ) -> Result<HourlyWeatherSeries> {
        if let Some(cache) = &self.cache {
            match cache.get(&query.key) {
                Ok(Some(cached)) if cached.is_fresh(Utc::now()) => {
                    debug!("Cache hit for {}", query.key);
                    return HourlyWeatherSeries::from_response_body(&cached.body, parameters);
                }
                Ok(Some(_)) => debug!("Cache entry for {} is stale", query.key),
                Ok(None) => {}
                Err(e) => warn!("Cache lookup failed for {}: {}", query.key, e),
            }
        }

        let (body, series) = self.get_with_retry(query, parameters).await?;

        if let Some(cache) = &self.cache {
            // The archive reports recent hours as null until they are observed.
            let policy = match query.policy {
                CachePolicy::Indefinite if series.records().iter().any(|r| !r.is_complete()) => {
                    debug!("Response for {} has unsettled hours, caching with TTL", query.key);
                    CachePolicy::ExpiresAfter(self.config.forecast_ttl)
                }
                policy => policy,
            };
            let entry = CachedResponse {
                body,
                stored_at: Utc::now(),
                policy,
            };
            if let Err(e) = cache.put(&query.key, &entry) {
                warn!("Failed to cache response for {}: {}", query.key, e);
            }
        }
        info!(
            "Fetched {} hourly rows of {} parameters from {}",
            series.len(),
            parameters.len(),
            query.url
        );
        Ok(series)
    }

    /// GET and decode the query, retrying transport errors, server errors and
    /// undecodable bodies with exponential backoff.
    async fn get_with_retry(
        &self,
        query: &SeriesQuery,
        parameters: &[Parameter],
    ) -> Result<(String, HourlyWeatherSeries)> {
        let attempts = self.config.max_retries + 1;
        let mut sleep_duration = self.config.initial_backoff;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.http.get(&query.url).query(&query.pairs).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_client_error() {
                        let reason = response.text().await.unwrap_or_default();
                        return Err(WeatherError::Rejected {
                            status: status.as_u16(),
                            reason,
                        });
                    }
                    if !status.is_success() {
                        last_error = format!("bad response status {status}");
                        warn!(
                            "Attempt {}/{}: Bad response status from {}: {}",
                            attempt, attempts, query.url, status
                        );
                    } else {
                        match response.text().await {
                            Ok(body) => {
                                match HourlyWeatherSeries::from_response_body(&body, parameters) {
                                    Ok(series) => return Ok((body, series)),
                                    Err(e) => {
                                        last_error = e.to_string();
                                        warn!(
                                            "Attempt {}/{}: Undecodable response from {}: {}",
                                            attempt, attempts, query.url, e
                                        );
                                    }
                                }
                            }
                            Err(e) => {
                                last_error = e.to_string();
                                warn!(
                                    "Attempt {}/{}: Failed to read response body from {}: {}",
                                    attempt, attempts, query.url, e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "Attempt {}/{}: Request to {} failed: {}",
                        attempt, attempts, query.url, e
                    );
                }
            }

            if attempt < attempts {
                info!(
                    "Sleeping for {} milliseconds before retrying {}",
                    sleep_duration.as_millis(),
                    query.url
                );
                tokio::time::sleep(sleep_duration).await;
                sleep_duration *= 2;
            }
        }

        warn!("All {} attempts failed for {}", attempts, query.url);
        Err(WeatherError::DataUnavailable {
            attempts,
            last_error,
        })
    }
}

fn validate_parameters(parameters: &[Parameter], mode: Mode) -> Result<()> {
    if parameters.is_empty() {
        return Err(WeatherError::InvalidRequest(
            "at least one parameter is required".to_string(),
        ));
    }
    match parameters.iter().find(|p| !p.is_available(mode)) {
        Some(parameter) => Err(WeatherError::UnsupportedParameter {
            parameter: *parameter,
            mode,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::parameter::PREDICTOR_PARAMETERS;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SETTLED_BODY: &str = concat!(
        r#"{"utc_offset_seconds":7200,"#,
        r#""hourly":{"time":[1717192800,1717196400],"precipitation":[0.7,0.2]}}"#
    );
    const UNSETTLED_BODY: &str = concat!(
        r#"{"utc_offset_seconds":7200,"#,
        r#""hourly":{"time":[1717192800,1717196400],"precipitation":[0.7,null]}}"#
    );

    /// Answer each connection with the next of `replies` (the last one
    /// repeats) and count the requests served.
    async fn serve(replies: Vec<(u16, &'static str)>) -> (ClientConfig, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let served = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = replies[served.min(replies.len() - 1)];

                let mut request = Vec::<u8>::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status} Reply\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        let config = ClientConfig {
            archive_url: format!("{base}/v1/archive"),
            forecast_url: format!("{base}/v1/forecast"),
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        };
        (config, hits)
    }

    /// Lets a test inspect the cache after handing it to the client.
    struct SharedCache(Rc<MemoryCache>);

    impl ResponseCache for SharedCache {
        fn get(&self, key: &CacheKey) -> anyhow::Result<Option<CachedResponse>> {
            self.0.get(key)
        }

        fn put(&self, key: &CacheKey, response: &CachedResponse) -> anyhow::Result<()> {
            self.0.put(key, response)
        }
    }

    async fn fetch_june_first(client: &WeatherClient) -> Result<HourlyWeatherSeries> {
        client
            .fetch_historical(&[Parameter::Precipitation], day(2024, 6, 1), day(2024, 6, 1))
            .await
    }

    // Nothing listens on the discard port, so every attempt fails fast.
    fn unreachable_config() -> ClientConfig {
        ClientConfig {
            archive_url: "http://127.0.0.1:9/v1/archive".to_string(),
            forecast_url: "http://127.0.0.1:9/v1/forecast".to_string(),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            request_timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_inverted_range_fails_before_any_request() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let result = client
            .fetch_historical(&PREDICTOR_PARAMETERS, day(2024, 6, 2), day(2024, 6, 1))
            .await;
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_parameter_outside_mode_vocabulary() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let result = client
            .fetch_historical(
                &[Parameter::SoilTemperature0cm],
                day(2024, 6, 1),
                day(2024, 6, 2),
            )
            .await;
        assert!(matches!(
            result,
            Err(WeatherError::UnsupportedParameter {
                parameter: Parameter::SoilTemperature0cm,
                mode: Mode::Historical
            })
        ));
    }

    #[tokio::test]
    async fn test_forecast_horizon_is_bounded() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let result = client.fetch_forecast(&PREDICTOR_PARAMETERS, 0, 17).await;
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));
        let result = client.fetch_forecast(&[], 0, 3).await;
        assert!(matches!(result, Err(WeatherError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_data_unavailable() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let result = client
            .fetch_historical(&PREDICTOR_PARAMETERS, day(2024, 6, 1), day(2024, 6, 2))
            .await;
        match result {
            Err(WeatherError::DataUnavailable { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_skips_network() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let parameters = [Parameter::Precipitation];
        let query = client.series_query(
            &parameters,
            Mode::Historical,
            Window::Dates {
                start: day(2024, 6, 1),
                end: day(2024, 6, 1),
            },
        );
        assert_eq!(query.policy, CachePolicy::Indefinite);

        let cache = MemoryCache::new();
        cache
            .put(
                &query.key,
                &CachedResponse {
                    body: concat!(
                        r#"{"utc_offset_seconds":7200,"#,
                        r#""hourly":{"time":[1717192800],"precipitation":[0.7]}}"#
                    )
                    .to_string(),
                    stored_at: Utc::now() - TimeDelta::days(365),
                    policy: CachePolicy::Indefinite,
                },
            )
            .unwrap();
        let client = client.with_cache(Box::new(cache));

        let series = client
            .fetch_historical(&parameters, day(2024, 6, 1), day(2024, 6, 1))
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.records()[0].values, vec![Some(0.7)]);
    }

    #[tokio::test]
    async fn test_stale_cache_entry_is_refetched() {
        let client = WeatherClient::new(unreachable_config()).unwrap();
        let parameters = [Parameter::Precipitation];
        let query = client.series_query(
            &parameters,
            Mode::Forecast,
            Window::Days {
                past_days: 0,
                forecast_days: 1,
            },
        );
        let cache = MemoryCache::new();
        cache
            .put(
                &query.key,
                &CachedResponse {
                    body: r#"{"utc_offset_seconds":0,"hourly":{"time":[0],"precipitation":[0.1]}}"#
                        .to_string(),
                    stored_at: Utc::now() - TimeDelta::hours(2),
                    policy: CachePolicy::ExpiresAfter(TimeDelta::minutes(60)),
                },
            )
            .unwrap();
        let client = client.with_cache(Box::new(cache));

        let result = client.fetch_forecast(&parameters, 0, 1).await;
        assert!(matches!(result, Err(WeatherError::DataUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_retried_until_exhausted() {
        let (config, hits) = serve(vec![(200, r#"{"hourly":{"time":[1,"#)]).await;
        let client = WeatherClient::new(config).unwrap();
        match fetch_june_first(&client).await {
            Err(WeatherError::DataUnavailable { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let (config, hits) = serve(vec![(503, ""), (500, ""), (200, SETTLED_BODY)]).await;
        let client = WeatherClient::new(config).unwrap();
        let series = fetch_june_first(&client).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[1].values, vec![Some(0.2)]);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (config, hits) = serve(vec![(400, r#"{"error":true,"reason":"bad date"}"#)]).await;
        let client = WeatherClient::new(config).unwrap();
        match fetch_june_first(&client).await {
            Err(WeatherError::Rejected { status, reason }) => {
                assert_eq!(status, 400);
                assert!(reason.contains("bad date"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settled_response_is_cached_indefinitely() {
        let (config, hits) = serve(vec![(200, SETTLED_BODY)]).await;
        let cache = Rc::new(MemoryCache::new());
        let client = WeatherClient::new(config)
            .unwrap()
            .with_cache(Box::new(SharedCache(Rc::clone(&cache))));

        fetch_june_first(&client).await.unwrap();
        assert_eq!(cache.len(), 1);
        let query = client.series_query(
            &[Parameter::Precipitation],
            Mode::Historical,
            Window::Dates {
                start: day(2024, 6, 1),
                end: day(2024, 6, 1),
            },
        );
        let entry = cache.get(&query.key).unwrap().unwrap();
        assert_eq!(entry.body, SETTLED_BODY);
        assert_eq!(entry.policy, CachePolicy::Indefinite);

        // served from the cache the second time
        let again = fetch_june_first(&client).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsettled_history_is_cached_with_ttl() {
        let (config, _hits) = serve(vec![(200, UNSETTLED_BODY)]).await;
        let ttl = config.forecast_ttl;
        let cache = Rc::new(MemoryCache::new());
        let client = WeatherClient::new(config)
            .unwrap()
            .with_cache(Box::new(SharedCache(Rc::clone(&cache))));

        let series = fetch_june_first(&client).await.unwrap();
        assert_eq!(series.records()[1].values, vec![None]);
        let query = client.series_query(
            &[Parameter::Precipitation],
            Mode::Historical,
            Window::Dates {
                start: day(2024, 6, 1),
                end: day(2024, 6, 1),
            },
        );
        assert_eq!(query.policy, CachePolicy::Indefinite);
        let entry = cache.get(&query.key).unwrap().unwrap();
        assert_eq!(entry.policy, CachePolicy::ExpiresAfter(ttl));
    }

    #[test]
    fn test_forecast_key_carries_issue_date() {
        let client = WeatherClient::new(ClientConfig::default()).unwrap();
        let query = client.series_query(
            &PREDICTOR_PARAMETERS,
            Mode::Forecast,
            Window::Days {
                past_days: 7,
                forecast_days: 16,
            },
        );
        let today = Utc::now().date_naive().format(YEAR_FORMAT).to_string();
        assert!(query.key.as_str().ends_with(&format!("issued={today}")));
        assert!(query
            .key
            .as_str()
            .contains("hourly=precipitation,wind_speed_10m,wind_gusts_10m"));
        assert!(!query.pairs.iter().any(|(k, _)| *k == "issued"));
    }
}
