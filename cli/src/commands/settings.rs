use anyhow::{Result, bail};

use calorie_core::models::{Settings, SettingsUpdate, ThemeMode, validate_calorie_target};
use calorie_core::store::Store;

fn print_settings(settings: &Settings) {
    let target = settings.daily_calorie_target;
    let theme = settings.theme;
    println!("Daily calorie target: {target} kcal");
    println!("Theme: {theme}");
}

pub(crate) fn cmd_settings_show(store: &Store, json: bool) -> Result<()> {
    let settings = store.get_settings()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_settings(&settings);
    }
    Ok(())
}

pub(crate) fn cmd_settings_set(
    store: &Store,
    target: Option<i64>,
    theme: Option<&str>,
    json: bool,
) -> Result<()> {
    if target.is_none() && theme.is_none() {
        bail!("Nothing to update. Provide at least one of --target or --theme");
    }
    if let Some(t) = target {
        validate_calorie_target(t)?;
    }
    let theme = theme.map(str::parse::<ThemeMode>).transpose()?;

    let settings = store.update_settings(&SettingsUpdate {
        daily_calorie_target: target,
        theme,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_settings(&settings);
        if target.is_some() {
            println!("Goal updated for today and later entries; earlier days are unchanged.");
        }
    }
    Ok(())
}
