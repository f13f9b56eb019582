// Live log tailing
//
// The server's live log is polled with a `lastid` cursor; only entries
// newer than the cursor come back. The cursor lives on the connection,
// so repeated calls tail the log incrementally.

use crate::error::Error;
use crate::models::{LivelogResponse, LogEntry};
use crate::server::UrbackupServer;
use crate::transport::params;

impl UrbackupServer {
    /// New live-log entries since the previous call on this connection.
    ///
    /// `livelog` action. `clientid` of `None` tails the server-wide log
    /// (wire value 0). After a successful call the cursor advances to the
    /// id of the last entry returned, so the next call only yields newer
    /// lines; an empty answer leaves it unchanged.
    pub fn get_livelog(&mut self, clientid: Option<i64>) -> Result<Vec<LogEntry>, Error> {
        self.login()?;
        let answer: LivelogResponse = self.call_json(
            "livelog",
            params(&[
                ("clientid", &clientid.unwrap_or(0).to_string()),
                ("lastid", &self.last_log_id.to_string()),
            ]),
        )?;
        let Some(logdata) = answer.logdata else {
            return Err(Error::UnexpectedShape {
                action: "livelog",
                field: "logdata",
            });
        };
        if let Some(last) = logdata.last() {
            self.last_log_id = last.id;
        }
        Ok(logdata)
    }
}
