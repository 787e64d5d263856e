//! Typing Racer - Race simulation core and Tauri backend
//!
//! The simulation library builds headless. With the `desktop` feature
//! it also provides the Tauri commands the frontend calls each frame.

pub mod game_server;

pub use game_server::{
    Accelerate, Competitor, ConfigError, GameConfig, GameServer, GameSnapshot, GameState,
    KeyOutcome, RaceCoordinator, RaceStatus, TypingChallenge,
};

#[cfg(feature = "desktop")]
mod commands {
    use crate::game_server::race::RaceResult;
    use crate::game_server::simulation::{GameServer, GameSnapshot, GameState, ServerStats};
    use crate::game_server::{GameConfig, KeyOutcome};
    use std::sync::Mutex;
    use tauri::State;

    /// Initialize a new race, optionally overriding defaults
    #[tauri::command]
    pub fn init_race(
        server: State<'_, Mutex<GameServer>>,
        pacer_count: Option<u32>,
        race_distance: Option<f32>,
        config_json: Option<String>,
    ) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;

        let mut config = match config_json {
            Some(raw) => GameConfig::from_json(&raw).map_err(|e| e.to_string())?,
            None => GameConfig::default(),
        };
        if let Some(count) = pacer_count {
            config.race.pacer_count = count;
        }
        if let Some(distance) = race_distance {
            config.race.distance = distance;
        }

        server.init_race(config).map_err(|e| e.to_string())
    }

    /// Start the race
    #[tauri::command]
    pub fn start_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.start_race();
        Ok(())
    }

    /// Start/restart button
    #[tauri::command]
    pub fn restart_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.restart();
        Ok(())
    }

    /// Perform a simulation tick and return the current state
    #[tauri::command]
    pub fn tick(server: State<'_, Mutex<GameServer>>) -> Result<Option<GameSnapshot>, String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.tick())
    }

    /// Forward a keypress; named keys like "Enter" are ignored
    #[tauri::command]
    pub fn submit_key(
        server: State<'_, Mutex<GameServer>>,
        key: String,
    ) -> Result<Option<KeyOutcome>, String> {
        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            log::warn!("Ignoring non-character key {:?}", key);
            return Ok(None);
        };

        let mut server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.submit_key(c))
    }

    /// Get current snapshot without advancing simulation
    #[tauri::command]
    pub fn get_snapshot(
        server: State<'_, Mutex<GameServer>>,
    ) -> Result<Option<GameSnapshot>, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_snapshot())
    }

    /// Get final standings
    #[tauri::command]
    pub fn get_results(
        server: State<'_, Mutex<GameServer>>,
    ) -> Result<Option<Vec<RaceResult>>, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_results())
    }

    /// Get server statistics
    #[tauri::command]
    pub fn get_stats(server: State<'_, Mutex<GameServer>>) -> Result<ServerStats, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_stats())
    }

    /// Get current game state
    #[tauri::command]
    pub fn get_game_state(server: State<'_, Mutex<GameServer>>) -> Result<GameState, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_state())
    }

    /// Pause the simulation
    #[tauri::command]
    pub fn pause_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.pause();
        log::info!("Race paused");
        Ok(())
    }

    /// Resume the simulation
    #[tauri::command]
    pub fn resume_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.resume();
        log::info!("Race resumed");
        Ok(())
    }

    /// Reset to idle state
    #[tauri::command]
    pub fn reset_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.reset();
        log::info!("Server reset");
        Ok(())
    }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Mutex;

    tauri::Builder::default()
        .manage(Mutex::new(GameServer::new()))
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            log::info!("Typing racer game server initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::init_race,
            commands::start_race,
            commands::restart_race,
            commands::tick,
            commands::submit_key,
            commands::get_snapshot,
            commands::get_results,
            commands::get_stats,
            commands::get_game_state,
            commands::pause_race,
            commands::resume_race,
            commands::reset_race,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
