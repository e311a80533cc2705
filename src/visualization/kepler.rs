use super::sampled;
use crate::frame::SociomeDataFrame;
use crate::performance::Timer;
use anyhow::{Context, Result};
use log::info;
use serde_json::json;
use std::path::Path;

pub const MAP_LATITUDE: f64 = 41.7418876;
pub const MAP_LONGITUDE: f64 = -87.9063053;
pub const MAP_ZOOM: f64 = 10.0;
pub const MAP_HEIGHT: u32 = 400;

const KEPLER_VERSION: &str = "2.5.5";

/// Map state every page opens at.
pub fn default_config() -> serde_json::Value {
    json!({
        "version": "v1",
        "config": {
            "mapState": {
                "latitude": MAP_LATITUDE,
                "longitude": MAP_LONGITUDE,
                "zoom": MAP_ZOOM,
            }
        }
    })
}

// `</` inside an inline script would close the tag early.
fn script_safe(value: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

impl SociomeDataFrame {
    /// Self-contained kepler.gl page showing the selected columns.
    pub fn to_kepler_string(&self, columns: &[&str], sampling_rate: f64) -> Result<String> {
        let frame = sampled(self, sampling_rate)?;
        let data = frame.select(columns)?.to_geojson_value();
        let config = default_config();

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8"/>
<title>sociome</title>
<script src="https://unpkg.com/react@16.8.4/umd/react.production.min.js"></script>
<script src="https://unpkg.com/react-dom@16.8.4/umd/react-dom.production.min.js"></script>
<script src="https://unpkg.com/redux@3.7.2/dist/redux.js"></script>
<script src="https://unpkg.com/react-redux@7.1.3/dist/react-redux.min.js"></script>
<script src="https://unpkg.com/styled-components@4.1.3/dist/styled-components.min.js"></script>
<script src="https://unpkg.com/kepler.gl@{version}/umd/keplergl.min.js"></script>
<style>body {{ margin: 0; }}</style>
</head>
<body>
<div id="app" style="height: {height}px;"></div>
<script>
const data = {data};
const config = {config};
const reducers = Redux.combineReducers({{ keplerGl: KeplerGl.keplerGlReducer }});
const store = Redux.createStore(reducers, {{}}, Redux.applyMiddleware(KeplerGl.taskMiddleware));
const app = React.createElement(ReactRedux.Provider, {{ store }},
  React.createElement(KeplerGl.KeplerGl, {{ id: "map", width: window.innerWidth, height: {height} }}));
ReactDOM.render(app, document.getElementById("app"));
store.dispatch(KeplerGl.addDataToMap({{
  datasets: {{ info: {{ id: "sociome", label: "sociome" }}, data: KeplerGl.processGeojson(data) }},
  config: KeplerGl.KeplerGlSchema.parseSavedConfig(config),
}}));
</script>
</body>
</html>
"#,
            version = KEPLER_VERSION,
            height = MAP_HEIGHT,
            data = script_safe(&data)?,
            config = script_safe(&config)?,
        ))
    }

    pub fn to_kepler_html<P: AsRef<Path>>(&self, path: P, columns: &[&str], sampling_rate: f64) -> Result<()> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] to_kepler_html");
        info!("[SociomeDataFrame] Writing kepler map of {:?} to {}", columns, path.display());
        let html = self.to_kepler_string(columns, sampling_rate)?;
        std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        timer.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, Value};

    #[test]
    fn page_embeds_selected_columns_and_map_state() {
        let mut frame = SociomeDataFrame::from_geometry(vec![Some(Geometry::point(-87.6, 41.8))]);
        frame.set_column("name", vec![Value::from("</script>")]).unwrap();
        frame.set_column("pm25", vec![Value::from(9.5)]).unwrap();

        let html = frame.to_kepler_string(&["name", "pm25"], 1.0).unwrap();
        assert!(html.contains("41.7418876"));
        assert!(html.contains("-87.9063053"));
        assert!(html.contains(r#""pm25":9.5"#));
        // Six library tags plus the inline script; the value is escaped.
        assert_eq!(html.matches("</script>").count(), 7);
        assert!(html.contains(r"<\/script>"));

        assert!(frame.to_kepler_string(&["missing"], 1.0).is_err());
    }
}
