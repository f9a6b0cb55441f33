#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use weather_features::WeatherConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const WEATHER_PATH: &str = "/data/2.5/weather";
pub const API_KEY: &str = "integration-key";

/// A current-weather document as OpenWeatherMap returns it.
pub fn sample_observation(city: &str, city_id: i64, temp: f64) -> Value {
    json!({
        "coord": {"lon": 2.3488, "lat": 48.8534},
        "weather": [
            {"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}
        ],
        "base": "stations",
        "main": {
            "temp": temp,
            "feels_like": temp - 1.0,
            "temp_min": temp - 2.0,
            "temp_max": temp + 2.0,
            "pressure": 1021,
            "humidity": 64,
            "sea_level": 1021,
            "grnd_level": 1011
        },
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 250, "gust": 7},
        "clouds": {"all": 0},
        "dt": 1760872800,
        "sys": {"type": 2, "id": 2041230, "country": "FR", "sunrise": 1760853980, "sunset": 1760892560},
        "timezone": 7200,
        "id": city_id,
        "name": city,
        "cod": 200
    })
}

pub fn config(server: &MockServer, cache_dir: &Path, ttl: Duration) -> WeatherConfig {
    WeatherConfig::builder()
        .api_key(API_KEY)
        .api_url(format!("{}{}", server.uri(), WEATHER_PATH))
        .port(8815)
        .cache_dir(cache_dir)
        .cache_ttl(ttl)
        .build()
}

pub async fn mount_city(server: &MockServer, city: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", city))
        .and(query_param("appid", API_KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_city_status(server: &MockServer, city: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", city))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "cod": status.to_string(),
            "message": "upstream failure"
        })))
        .mount(server)
        .await;
}

fn is_city(request: &Request, city: &str) -> bool {
    request
        .url
        .query_pairs()
        .any(|(key, value)| key == "q" && value == city)
}

/// Number of upstream requests made for `city`.
pub async fn requests_for(server: &MockServer, city: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| is_city(request, city))
        .count()
}
