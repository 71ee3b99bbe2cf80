//! OSRM HTTP adapter for distance tables and route geometry.
//!
//! One client serves both the Table service (network distance matrices) and
//! the Route service (connected geometry for a tour). Response interpretation
//! is kept in plain functions so the contract rules can be checked without a
//! server.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::location::LocationSet;
use crate::matrix::{Distance, DistanceMatrix, MatrixMode, METERS_TO_MILES};
use crate::polyline::Polyline;
use crate::traits::{DistanceMatrixProvider, ResponseRecorder, RouteGeometry, RouteGeometryProvider};

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "park-tour/0.1";

/// Public demo server run by the OSRM project.
pub const PUBLIC_OSRM_URL: &str = "http://router.project-osrm.org";

/// Table requests above this many coordinates risk rejection by shared servers.
pub const DEFAULT_TABLE_SIZE_WARNING: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    /// Timeout for a whole table request, in seconds.
    pub table_timeout_secs: u64,
    /// Timeout for a whole route request, in seconds.
    pub route_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Coordinate count above which a table request logs a warning.
    pub table_size_warning: usize,
    /// Extra attempts made only when the connection itself fails.
    pub connect_retries: u32,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            table_timeout_secs: 120,
            route_timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            table_size_warning: DEFAULT_TABLE_SIZE_WARNING,
            connect_retries: 1,
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Configuration for the public OSRM demo server.
    pub fn public() -> Self {
        Self::new(PUBLIC_OSRM_URL)
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_timeouts(mut self, table_secs: u64, route_secs: u64) -> Self {
        self.table_timeout_secs = table_secs;
        self.route_timeout_secs = route_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_table_size_warning(mut self, threshold: usize) -> Self {
        self.table_size_warning = threshold;
        self
    }

    pub fn with_connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }
}

#[derive(Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    recorder: Option<Arc<dyn ResponseRecorder>>,
}

impl fmt::Debug for OsrmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsrmClient")
            .field("config", &self.config)
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(
                config.table_timeout_secs.max(config.route_timeout_secs),
            ))
            .build()?;

        Ok(Self {
            config,
            client,
            recorder: None,
        })
    }

    /// Hand every raw JSON response to `recorder` before it is interpreted.
    pub fn with_recorder(mut self, recorder: Arc<dyn ResponseRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    pub fn table_url(&self, coords: &[(f64, f64)]) -> String {
        format!(
            "{}/table/v1/{}/{}?annotations=distance",
            self.base_url(),
            self.config.profile,
            coordinate_path(coords)
        )
    }

    pub fn route_url(&self, coords: &[(f64, f64)]) -> String {
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url(),
            self.config.profile,
            coordinate_path(coords)
        )
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// GET `url` and decode the JSON body of a successful response.
    fn fetch(&self, service: &str, url: &str, timeout: Duration) -> Result<serde_json::Value> {
        let response = self.send(url, timeout)?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| self.unavailable(&err, url, timeout))?;

        if !status.is_success() {
            let (code, message) = error_details(&body).unwrap_or_else(|| {
                (
                    status.canonical_reason().unwrap_or("HTTP error").to_string(),
                    excerpt(&body),
                )
            });
            return Err(PlannerError::Provider {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|err| {
            PlannerError::malformed(format!("{service} response is not valid JSON: {err}"))
        })?;

        if let Some(recorder) = &self.recorder {
            if let Err(err) = recorder.record(service, &value) {
                warn!(service, error = %err, "failed to record OSRM response");
            }
        }

        Ok(value)
    }

    fn send(&self, url: &str, timeout: Duration) -> Result<reqwest::blocking::Response> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).timeout(timeout).send() {
                Ok(response) => return Ok(response),
                Err(err) if err.is_connect() && attempt < self.config.connect_retries => {
                    attempt += 1;
                    warn!(attempt, error = %err, "OSRM connection failed; retrying");
                }
                Err(err) => return Err(self.unavailable(&err, url, timeout)),
            }
        }
    }

    fn unavailable(&self, error: &reqwest::Error, url: &str, timeout: Duration) -> PlannerError {
        let message = if error.is_timeout() {
            format!("timed out after {}s", timeout.as_secs_f64())
        } else {
            error.to_string()
        };
        PlannerError::ProviderUnavailable {
            url: url.to_string(),
            message,
        }
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, locations: &LocationSet) -> Result<DistanceMatrix> {
        let n = locations.len();
        if n > self.config.table_size_warning {
            warn!(
                locations = n,
                threshold = self.config.table_size_warning,
                "table request is large; a shared OSRM server may reject or truncate it"
            );
        }

        let url = self.table_url(&locations.coords());
        debug!(locations = n, %url, "requesting OSRM table");

        let body = self.fetch(
            "table",
            &url,
            Duration::from_secs(self.config.table_timeout_secs),
        )?;
        let response: TableResponse = serde_json::from_value(body)
            .map_err(|err| PlannerError::malformed(format!("table response: {err}")))?;

        interpret_table(response, locations.names().map(str::to_string).collect())
    }
}

impl RouteGeometryProvider for OsrmClient {
    fn route_for(&self, waypoints: &[(f64, f64)]) -> Result<RouteGeometry> {
        if waypoints.len() < 2 {
            return Err(PlannerError::InsufficientData {
                required: 2,
                actual: waypoints.len(),
            });
        }

        let url = self.route_url(waypoints);
        debug!(waypoints = waypoints.len(), %url, "requesting OSRM route");

        let body = self.fetch(
            "route",
            &url,
            Duration::from_secs(self.config.route_timeout_secs),
        )?;
        let response: RouteResponse = serde_json::from_value(body)
            .map_err(|err| PlannerError::malformed(format!("route response: {err}")))?;

        interpret_route(response)
    }
}

/// Semicolon-separated `lng,lat` pairs, the coordinate form OSRM expects.
fn coordinate_path(coords: &[(f64, f64)]) -> String {
    coords
        .iter()
        .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn error_details(body: &str) -> Option<(String, String)> {
    let error: ErrorResponse = serde_json::from_str(body).ok()?;
    Some((error.code, error.message.unwrap_or_default()))
}

fn excerpt(body: &str) -> String {
    body.chars().take(500).collect()
}

fn service_error(code: String, message: Option<String>) -> PlannerError {
    PlannerError::Provider {
        status: 200,
        code,
        message: message.unwrap_or_default(),
    }
}

/// Turn a Table response into a network matrix over `names`.
///
/// Rows and columns are taken in the order OSRM returns them, which is the
/// order the coordinates were submitted in.
pub fn interpret_table(response: TableResponse, names: Vec<String>) -> Result<DistanceMatrix> {
    if !response.is_ok() {
        return Err(service_error(response.code, response.message));
    }

    let n = names.len();
    let distances = response.distances.ok_or_else(|| {
        service_error(
            response.code.clone(),
            Some("response is missing the distances table".to_string()),
        )
    })?;

    for (label, waypoints) in [("sources", &response.sources), ("destinations", &response.destinations)] {
        if let Some(waypoints) = waypoints {
            if waypoints.len() != n {
                return Err(PlannerError::malformed(format!(
                    "{} {label} returned for {n} coordinates",
                    waypoints.len()
                )));
            }
        }
    }

    if distances.len() != n {
        return Err(PlannerError::malformed(format!(
            "distance table has {} rows for {n} coordinates",
            distances.len()
        )));
    }

    let mut cells = Vec::with_capacity(n * n);
    for (i, row) in distances.into_iter().enumerate() {
        if row.len() != n {
            return Err(PlannerError::malformed(format!(
                "distance table row {i} has {} columns for {n} coordinates",
                row.len()
            )));
        }
        for (j, meters) in row.into_iter().enumerate() {
            let cell = match meters {
                _ if i == j => Distance::ZERO,
                None => Distance::Unreachable,
                Some(meters) if meters.is_finite() && meters >= 0.0 => {
                    Distance::Miles(meters * METERS_TO_MILES)
                }
                Some(meters) => {
                    return Err(PlannerError::malformed(format!(
                        "invalid distance {meters} at row {i}, column {j}"
                    )));
                }
            };
            cells.push(cell);
        }
    }

    DistanceMatrix::from_cells(MatrixMode::Network, names, cells)
        .map_err(|err| PlannerError::malformed(err.to_string()))
}

/// Extract the first route of a Route response.
pub fn interpret_route(response: RouteResponse) -> Result<RouteGeometry> {
    if !response.is_ok() {
        return Err(service_error(response.code, response.message));
    }

    let route = response
        .routes
        .and_then(|routes| routes.into_iter().next())
        .ok_or_else(|| PlannerError::malformed("route response contains no routes"))?;

    let geometry = route
        .geometry
        .ok_or_else(|| PlannerError::malformed("route is missing its geometry"))?;
    let distance_meters = route
        .distance
        .ok_or_else(|| PlannerError::malformed("route is missing its distance"))?;
    let duration_seconds = route
        .duration
        .ok_or_else(|| PlannerError::malformed("route is missing its duration"))?;

    if !(distance_meters.is_finite() && distance_meters >= 0.0)
        || !(duration_seconds.is_finite() && duration_seconds >= 0.0)
    {
        return Err(PlannerError::malformed(format!(
            "route has invalid totals: {distance_meters} m, {duration_seconds} s"
        )));
    }

    Ok(RouteGeometry {
        geometry: Polyline::from_geojson(&geometry)?,
        distance_meters,
        duration_seconds,
    })
}

/// OSRM Table API response.
///
/// See: <http://project-osrm.org/docs/v5.24.0/api/#table-service>
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// `"Ok"` on success, otherwise an error code such as `"InvalidQuery"`.
    pub code: String,
    pub message: Option<String>,
    /// Distances in meters; `None` where no route exists.
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    /// Snapped waypoints for each row.
    pub sources: Option<Vec<serde_json::Value>>,
    /// Snapped waypoints for each column.
    pub destinations: Option<Vec<serde_json::Value>>,
}

impl TableResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    pub message: Option<String>,
    pub routes: Option<Vec<OsrmRoute>>,
}

impl RouteResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// GeoJSON geometry when requested with `geometries=geojson`.
    pub geometry: Option<serde_json::Value>,
    /// Meters.
    pub distance: Option<f64>,
    /// Seconds.
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: String,
    message: Option<String>,
}
