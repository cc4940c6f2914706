use anyhow::Result;

use crate::{
    cli::{Commands, SettingsCommand},
    config::Config,
    db::Db,
    json_view::{parse_json_view, render_json_view},
    models::TrackingParameterList,
    params::{extract_parameters, generate_modified_url, remove_tracking_parameters, COMMON_UTM_PARAMETERS},
    store::SettingsStore,
    web,
};

pub async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve => {
            let store = open_store(&config).await?;
            web::run_server(config, store).await
        }
        Commands::Params { url } => {
            println!("{}", serde_json::to_string_pretty(&extract_parameters(&url))?);
            Ok(())
        }
        Commands::Clean { url, params, utm } => {
            let mut tracking = if params.is_empty() && !utm {
                open_store(&config).await?.load().await?.tracking_parameters
            } else {
                TrackingParameterList::from_names(&params)
            };
            if utm {
                tracking = TrackingParameterList::from_names(
                    tracking.as_slice().iter().map(String::as_str).chain(COMMON_UTM_PARAMETERS),
                );
            }
            let parameters = remove_tracking_parameters(&url, tracking.as_slice());
            println!("{}", generate_modified_url(&url, &parameters)?);
            Ok(())
        }
        Commands::Rebuild { url, set } => {
            println!("{}", generate_modified_url(&url, &set.into_iter().collect())?);
            Ok(())
        }
        Commands::Settings(cmd) => settings(cmd, &open_store(&config).await?).await,
    }
}

async fn open_store(config: &Config) -> Result<SettingsStore> {
    Ok(SettingsStore::new(Db::new(&config.database_url).await?))
}

async fn settings(cmd: SettingsCommand, store: &SettingsStore) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&store.load().await?)?);
        }
        SettingsCommand::Add { name } => {
            let list = store.add_and_save_tracking_parameter(&name).await?;
            println!("{}", render_json_view(&list));
        }
        SettingsCommand::Json => {
            println!("{}", render_json_view(&store.load().await?.tracking_parameters));
        }
        SettingsCommand::EditJson { json } => {
            let list = parse_json_view(&json)?;
            let record = store.save_tracking_parameters(list).await?;
            println!("{}", render_json_view(&record.tracking_parameters));
        }
        SettingsCommand::Language { language } => {
            let mut record = store.load().await?;
            record.language = language;
            store.save(&record).await?;
        }
        SettingsCommand::Theme { theme } => {
            let mut record = store.load().await?;
            record.theme = theme;
            store.save(&record).await?;
        }
        SettingsCommand::Reset => store.reset().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, Theme};

    async fn store() -> SettingsStore {
        SettingsStore::new(Db::new("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_settings_commands() {
        let store = store().await;
        settings(SettingsCommand::Add { name: "gclid".into() }, &store).await.unwrap();
        settings(SettingsCommand::Language { language: Language::ZhCn }, &store).await.unwrap();
        settings(SettingsCommand::Theme { theme: Theme::Dark }, &store).await.unwrap();

        let record = store.load().await.unwrap();
        assert_eq!(record.tracking_parameters, TrackingParameterList::from_names(["gclid"]));
        assert_eq!(record.language, Language::ZhCn);
        assert_eq!(record.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_edit_json_rejects_bad_input() {
        let store = store().await;
        settings(SettingsCommand::Add { name: "gclid".into() }, &store).await.unwrap();

        let result = settings(SettingsCommand::EditJson { json: "not json".into() }, &store).await;
        assert!(result.is_err());
        assert_eq!(
            store.load().await.unwrap().tracking_parameters,
            TrackingParameterList::from_names(["gclid"])
        );
    }

    #[tokio::test]
    async fn test_rebuild_invalid_url() {
        let config = Config {
            database_url: "sqlite::memory:".into(),
            server_addr: "127.0.0.1:0".into(),
            app_env: "development".into(),
        };
        let result = run(Commands::Rebuild { url: "nope".into(), set: vec![] }, config).await;
        assert!(result.is_err());
    }
}
