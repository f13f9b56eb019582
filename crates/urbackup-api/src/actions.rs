// Running activities
//
// The `progress` action doubles as list-and-control surface: called bare
// it reports in-flight activities, called with `stop_clientid`/`stop_id`
// it stops one. The stop acknowledgement is the same progress listing.

use crate::error::Error;
use crate::models::{ProgressResponse, RunningAction};
use crate::server::UrbackupServer;
use crate::transport::{Params, params};

impl UrbackupServer {
    /// Activities currently running on the server.
    ///
    /// `progress` action.
    pub fn get_actions(&mut self) -> Result<Vec<RunningAction>, Error> {
        self.login()?;
        let answer: ProgressResponse = self.call_json("progress", Params::new())?;
        answer.progress.ok_or(Error::UnexpectedShape {
            action: "progress",
            field: "progress",
        })
    }

    /// Ask the server to stop a running activity.
    ///
    /// The record must carry both `clientid` and `id`; an incomplete one
    /// is rejected before any network traffic. Stopping an activity that
    /// has already finished is not an error -- the server simply answers
    /// with the current (shorter) progress list.
    pub fn stop_action(&mut self, action: &RunningAction) -> Result<(), Error> {
        let Some(clientid) = action.clientid else {
            return Err(Error::MissingField("clientid"));
        };
        let Some(id) = action.id else {
            return Err(Error::MissingField("id"));
        };

        self.login()?;
        let answer: ProgressResponse = self.call_json(
            "progress",
            params(&[
                ("stop_clientid", &clientid.to_string()),
                ("stop_id", &id.to_string()),
            ]),
        )?;
        if answer.progress.is_some() {
            Ok(())
        } else {
            Err(Error::UnexpectedShape {
                action: "progress",
                field: "progress",
            })
        }
    }
}
