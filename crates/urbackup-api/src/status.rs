// Status and usage queries
//
// Read-only facade over the `status` and `usage` actions.

use tracing::warn;

use crate::error::Error;
use crate::models::{ClientStatus, ExtraClient, StatusResponse, UsageEntry, UsageResponse};
use crate::server::UrbackupServer;
use crate::transport::Params;

impl UrbackupServer {
    /// Current backup status of every client visible to this login.
    ///
    /// `status` action.
    pub fn get_status(&mut self) -> Result<Vec<ClientStatus>, Error> {
        self.login()?;
        let status: StatusResponse = self.call_json("status", Params::new())?;
        status.status.ok_or(Error::UnexpectedShape {
            action: "status",
            field: "status",
        })
    }

    /// Status record of one client, matched by name.
    ///
    /// The status list is scanned linearly and the first match wins; the
    /// server does not disambiguate duplicate names. A missing name can
    /// also mean the logged-in account lacks rights to see the client.
    pub fn get_client_status(&mut self, clientname: &str) -> Result<ClientStatus, Error> {
        let status = self.get_status()?;
        match status.into_iter().find(|client| client.name == clientname) {
            Some(client) => Ok(client),
            None => {
                warn!(clientname, "client not in server status (unknown name or no permission)");
                Err(Error::ClientNotFound(clientname.to_owned()))
            }
        }
    }

    /// The server identity string clients authenticate against.
    ///
    /// `status` action, `server_identity` key.
    pub fn get_server_identity(&mut self) -> Result<String, Error> {
        self.login()?;
        let status: StatusResponse = self.call_json("status", Params::new())?;
        status.server_identity.ok_or(Error::UnexpectedShape {
            action: "status",
            field: "server_identity",
        })
    }

    /// Storage usage per client, sizes in bytes.
    ///
    /// `usage` action.
    pub fn get_usage(&mut self) -> Result<Vec<UsageEntry>, Error> {
        self.login()?;
        let usage: UsageResponse = self.call_json("usage", Params::new())?;
        usage.usage.ok_or(Error::UnexpectedShape {
            action: "usage",
            field: "usage",
        })
    }

    /// Clients registered by network address only (agent-less monitoring).
    ///
    /// `status` action, `extra_clients` key.
    pub fn get_extra_clients(&mut self) -> Result<Vec<ExtraClient>, Error> {
        self.login()?;
        let status: StatusResponse = self.call_json("status", Params::new())?;
        status.extra_clients.ok_or(Error::UnexpectedShape {
            action: "status",
            field: "extra_clients",
        })
    }
}
