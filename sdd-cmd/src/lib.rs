//! Command implementations for the storm damage CLI.
//!
//! Each subcommand corresponds to one view of the dashboard: current
//! weather, forecast simulation, manual storm, plus maintenance of the
//! SQLite store.

use clap::{Args, Subcommand};
use sdd_predict::ManualScenario;
use std::path::PathBuf;

pub mod config;
pub mod current;
pub mod forecast;
pub mod history;
pub mod import;
pub mod manual;
pub mod output;
pub mod session;
pub mod stations;

pub use config::Config;
pub use session::Session;

/// Where and how prediction rows are written.
#[derive(Args, Debug, Clone, Default)]
pub struct PredictionOutput {
    /// CSV output path (stdout when omitted)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Also write map features (WKT geometry and centroid) as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Only keep rows whose total probability reaches this value
    #[arg(long, default_value_t = 0.0)]
    pub min_probability: f64,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the weather at the selected hour today and today's summary
    Current {
        /// Hour of the day (0-23)
        #[arg(long, default_value_t = 0)]
        hour: u32,
    },

    /// Fetch archived weather and write one summary row per day
    History {
        /// First date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start: String,

        /// Last date (YYYY-MM-DD)
        #[arg(short = 'e', long)]
        end: String,

        /// CSV output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Score the weather forecast against the grid for one date
    Forecast {
        /// Date to report (YYYY-MM-DD), defaults to today
        #[arg(short = 'd', long)]
        date: Option<String>,

        #[command(flatten)]
        output: PredictionOutput,
    },

    /// Score a hand-specified storm against the grid
    Manual {
        /// Month name or number; sets whether trees carry leaves
        #[arg(short = 'm', long)]
        month: Option<String>,

        /// Hour of the day the storm peaks
        #[arg(long, default_value_t = 12)]
        hour: u32,

        /// Current wind speed (m/s)
        #[arg(long, default_value_t = 10.0)]
        wind_speed: f64,

        /// Current wind gusts (m/s)
        #[arg(long, default_value_t = 15.0)]
        wind_gusts: f64,

        /// Rainfall over the past week (mm)
        #[arg(long, default_value_t = 15.0)]
        precipitation_past_week: f64,

        /// Strong wind over the past two days
        #[arg(long, default_value_t = 3.0)]
        strong_wind_past_2_days: f64,

        /// Average wind over the past two days (m/s)
        #[arg(long, default_value_t = 10.0)]
        avg_wind_past_2_days: f64,

        /// Maximum wind over the past day (m/s)
        #[arg(long, default_value_t = 5.0)]
        max_wind_past_day: f64,

        #[command(flatten)]
        output: PredictionOutput,
    },

    /// Export fire stations and service areas as JSON
    Stations {
        /// JSON output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Load grid cells and fire stations from CSV into the store
    Import {
        /// Grid cell CSV
        #[arg(long)]
        grid: Option<PathBuf>,

        /// Fire station CSV
        #[arg(long)]
        stations: Option<PathBuf>,
    },
}

/// Run one command against `session`.
///
/// The session outlives the command: a host that keeps it between calls
/// reuses the day's forecast and sees the latest map data. The CLI runs a
/// single command per session.
pub async fn run(config: &Config, session: &mut Session, command: Command) -> anyhow::Result<()> {
    config.validate()?;
    match command {
        Command::Current { hour } => {
            session.select_hour(hour)?;
            current::run_current(config, session).await
        }
        Command::History { start, end, output } => {
            history::run_history(config, &start, &end, output.as_deref()).await
        }
        Command::Forecast { date, output } => {
            if let Some(date) = date {
                session.select_date(sdd_utils::dates::parse_date(&date)?);
            }
            forecast::run_forecast(config, session, &output).await
        }
        Command::Manual {
            month,
            hour,
            wind_speed,
            wind_gusts,
            precipitation_past_week,
            strong_wind_past_2_days,
            avg_wind_past_2_days,
            max_wind_past_day,
            output,
        } => {
            session.select_hour(hour)?;
            let scenario = ManualScenario {
                hour,
                wind_speed,
                wind_gusts,
                precipitation_past_week,
                strong_wind_past_2_days,
                avg_wind_past_2_days,
                max_wind_past_day,
                ..ManualScenario::default()
            };
            manual::run_manual(config, session, scenario, month.as_deref(), &output)
        }
        Command::Stations { output } => stations::run_stations(config, output.as_deref()),
        Command::Import { grid, stations } => {
            import::run_import(config, grid.as_deref(), stations.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn manual(wind_gusts: f64, hour: u32, csv: &Path) -> Command {
        Command::Manual {
            month: Some("June".to_string()),
            hour,
            wind_speed: 10.0,
            wind_gusts,
            precipitation_past_week: 15.0,
            strong_wind_past_2_days: 3.0,
            avg_wind_past_2_days: 10.0,
            max_wind_past_day: 5.0,
            output: PredictionOutput {
                output: Some(csv.to_path_buf()),
                json: None,
                min_probability: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn session_keeps_the_latest_map_across_commands() {
        let dir = std::env::temp_dir().join(format!("sdd-session-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let grid = dir.join("grid.csv");
        std::fs::write(
            &grid,
            "cell_id,service_area,geometry,average_building_age,building_area,trees\n\
             A,Centrum,\"POLYGON((0 0,1 0,1 1,0 1,0 0))\",40,100,2\n",
        )
        .unwrap();
        let model = dir.join("gusts.json");
        std::fs::write(
            &model,
            r#"{"name":"gusts","feature_names":["wind_gusts_10m"],
                "coefficients":[1.0],"intercept":-20.0}"#,
        )
        .unwrap();
        let config = Config {
            database: dir.join("store.sqlite"),
            building_model: model.clone(),
            tree_model: model,
            ..Config::default()
        };
        let _ = std::fs::remove_file(&config.database);

        let mut session = Session::new();
        let import = Command::Import {
            grid: Some(grid),
            stations: None,
        };
        run(&config, &mut session, import).await.unwrap();
        assert!(session.map_data().is_none());

        let sigmoid = |z: f64| 1.0 / (1.0 + (-z).exp());
        run(&config, &mut session, manual(15.0, 9, &dir.join("calm.csv")))
            .await
            .unwrap();
        let calm = session.map_data().unwrap().rows[0].building_proba;
        assert!((calm - sigmoid(-5.0)).abs() < 1e-12);

        run(&config, &mut session, manual(25.0, 18, &dir.join("storm.csv")))
            .await
            .unwrap();
        let map = session.map_data().unwrap();
        assert_eq!(map.rows.len(), 1);
        assert!((map.rows[0].building_proba - sigmoid(5.0)).abs() < 1e-12);
        assert_eq!(session.selected_hour(), 18);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
