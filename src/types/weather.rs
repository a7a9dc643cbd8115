use serde::Deserialize;

/// OpenWeatherMap 当前天气响应，字段全部可选，缺失时视为异常载荷
#[derive(Debug, Default, Deserialize)]
pub struct OpenWeatherResponse {
    pub name: Option<String>,
    pub sys: Option<Sys>,
    pub main: Option<Main>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub wind: Option<Wind>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sys {
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Main {
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Condition {
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
}

/// 天气查询结果
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

impl OpenWeatherResponse {
    /// 转换为 WeatherReport，返回第一个缺失字段的名字作为错误
    pub fn into_report(self) -> Result<WeatherReport, &'static str> {
        let main = self.main.unwrap_or_default();
        Ok(WeatherReport {
            city: self.name.ok_or("name")?,
            country: self.sys.and_then(|s| s.country).ok_or("sys.country")?,
            temperature: main.temp.ok_or("main.temp")?,
            description: self
                .weather
                .into_iter()
                .next()
                .and_then(|c| c.description)
                .ok_or("weather[0].description")?,
            humidity: main.humidity.ok_or("main.humidity")?,
            wind_speed: self.wind.and_then(|w| w.speed).ok_or("wind.speed")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload_converts() {
        let payload = r#"{
            "name": "Paris",
            "sys": {"country": "FR"},
            "main": {"temp": 18.5, "humidity": 72},
            "weather": [{"description": "light rain", "main": "Rain"}],
            "wind": {"speed": 4.1}
        }"#;
        let resp: OpenWeatherResponse = serde_json::from_str(payload).unwrap();
        let report = resp.into_report().unwrap();
        assert_eq!(report.city, "Paris");
        assert_eq!(report.country, "FR");
        assert_eq!(report.humidity, 72.0);
        assert_eq!(report.description, "light rain");
    }

    #[test]
    fn test_missing_field_is_reported() {
        let payload = r#"{
            "name": "Paris",
            "sys": {"country": "FR"},
            "main": {"temp": 18.5},
            "weather": [{"description": "light rain"}]
        }"#;
        let resp: OpenWeatherResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(resp.into_report().unwrap_err(), "main.humidity");
    }

    #[test]
    fn test_first_missing_field_wins() {
        let payload = r#"{"name": "Paris", "sys": {"country": "FR"}, "main": {"temp": 18.5}}"#;
        let resp: OpenWeatherResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(resp.into_report().unwrap_err(), "weather[0].description");
    }
}
