// Settings read-modify-write
//
// The server has no single-key update: a change fetches the full settings
// map, replaces one value, and resubmits everything with a save marker
// (`sa=general_save` globally, `sa=clientsettings_save` plus `overwrite`
// and the client id per client). Success is the presence of `saved_ok` in
// the answer, not an echo of the new value.

use serde_json::Value;

use crate::error::Error;
use crate::models::{SaveSettingsResponse, Settings, SettingsResponse};
use crate::server::UrbackupServer;
use crate::transport::{Params, params};

/// Settings values are strings on the wire; the server hands back numbers
/// and booleans for some keys, which resubmit in their plain text form.
fn setting_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn settings_form(settings: &Settings) -> Params {
    settings
        .iter()
        .map(|(key, value)| (key.clone(), setting_text(value)))
        .collect()
}

impl UrbackupServer {
    fn fetch_settings(&self, query: Params) -> Result<Settings, Error> {
        let answer: SettingsResponse = self.call_json("settings", query)?;
        answer.settings.ok_or(Error::UnexpectedShape {
            action: "settings",
            field: "settings",
        })
    }

    fn save_settings(&self, form: Params) -> Result<(), Error> {
        let saved: SaveSettingsResponse = self.call_json("settings", form)?;
        if saved.saved_ok.is_some() {
            Ok(())
        } else {
            Err(Error::UnexpectedShape {
                action: "settings",
                field: "saved_ok",
            })
        }
    }

    /// The server-wide settings map.
    ///
    /// `settings` action, `sa=general`.
    pub fn get_global_settings(&mut self) -> Result<Settings, Error> {
        self.login()?;
        self.fetch_settings(params(&[("sa", "general")]))
    }

    /// Change one server-wide setting, leaving the rest untouched.
    ///
    /// `settings` action, `sa=general_save`, full map resubmitted.
    pub fn set_global_setting(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.login()?;
        let mut settings = self.fetch_settings(params(&[("sa", "general")]))?;
        settings.insert(key.to_owned(), Value::String(value.to_owned()));

        let mut form = settings_form(&settings);
        form.insert("sa".to_owned(), "general_save".to_owned());
        self.save_settings(form)
    }

    /// The settings map of one client, resolved by name.
    ///
    /// `settings` action, `sa=clientsettings`.
    pub fn get_client_settings(&mut self, clientname: &str) -> Result<Settings, Error> {
        let client = self.get_client_status(clientname)?;
        self.fetch_settings(params(&[
            ("sa", "clientsettings"),
            ("t_clientid", &client.id.to_string()),
        ]))
    }

    /// Change one setting of one client, leaving the rest untouched.
    ///
    /// `settings` action, `sa=clientsettings_save` with `overwrite=true`
    /// and `t_clientid`, full map resubmitted.
    pub fn change_client_setting(
        &mut self,
        clientname: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        let client = self.get_client_status(clientname)?;
        let clientid = client.id.to_string();
        let mut settings = self.fetch_settings(params(&[
            ("sa", "clientsettings"),
            ("t_clientid", &clientid),
        ]))?;
        settings.insert(key.to_owned(), Value::String(value.to_owned()));

        let mut form = settings_form(&settings);
        form.insert("overwrite".to_owned(), "true".to_owned());
        form.insert("sa".to_owned(), "clientsettings_save".to_owned());
        form.insert("t_clientid".to_owned(), clientid);
        self.save_settings(form)
    }

    /// The internet authkey a client must present to this server.
    ///
    /// Read out of the client's settings map (`internet_authkey`).
    pub fn get_client_authkey(&mut self, clientname: &str) -> Result<String, Error> {
        let settings = self.get_client_settings(clientname)?;
        settings
            .get("internet_authkey")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(Error::UnexpectedShape {
                action: "settings",
                field: "internet_authkey",
            })
    }
}
