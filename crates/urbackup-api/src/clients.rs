// Client registration and installer download
//
// `add_client` registers a machine server-side; `download_client` streams
// the pre-seeded installer. Extra clients (agent-less, address-only) ride
// on the `status` action with special parameters instead of a dedicated
// endpoint.

use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::models::{AddClientResponse, NewClient, StatusResponse};
use crate::server::UrbackupServer;
use crate::transport::params;

impl UrbackupServer {
    /// Register a new client on the server.
    ///
    /// `add_client` action. Returns the fresh client's id and internet
    /// authkey; a name the server already knows is `ClientExists`.
    pub fn add_client(&mut self, clientname: &str) -> Result<NewClient, Error> {
        self.login()?;
        let created: AddClientResponse =
            self.call_json("add_client", params(&[("clientname", clientname)]))?;

        if created.already_exists.is_some() {
            return Err(Error::ClientExists(clientname.to_owned()));
        }
        let Some(id) = created.new_clientid else {
            return Err(Error::UnexpectedShape {
                action: "add_client",
                field: "new_clientid",
            });
        };
        let Some(authkey) = created.new_authkey else {
            return Err(Error::UnexpectedShape {
                action: "add_client",
                field: "new_authkey",
            });
        };
        debug!(clientname, id, "client registered");
        Ok(NewClient { id, authkey })
    }

    /// Download the pre-configured installer for `clientname` to
    /// `installer_path`, registering the client first if needed.
    ///
    /// `add_client` + `download_client` actions. For a client the server
    /// already knows, the id is resolved through the status list and no
    /// authkey is sent; a fresh registration passes its authkey along so
    /// the generated installer embeds it. Returns the bytes written.
    pub fn download_installer(
        &mut self,
        installer_path: &Path,
        clientname: &str,
    ) -> Result<u64, Error> {
        self.login()?;
        let created: AddClientResponse =
            self.call_json("add_client", params(&[("clientname", clientname)]))?;

        if created.already_exists.is_some() {
            let client = self.get_client_status(clientname)?;
            return self.download_file(
                "download_client",
                params(&[("clientid", &client.id.to_string())]),
                installer_path,
            );
        }

        let Some(clientid) = created.new_clientid else {
            return Err(Error::UnexpectedShape {
                action: "add_client",
                field: "new_clientid",
            });
        };
        let Some(authkey) = created.new_authkey else {
            return Err(Error::UnexpectedShape {
                action: "add_client",
                field: "new_authkey",
            });
        };
        self.download_file(
            "download_client",
            params(&[
                ("clientid", &clientid.to_string()),
                ("authkey", &authkey),
            ]),
            installer_path,
        )
    }

    /// Register an agent-less client by hostname or address.
    ///
    /// `status` action with `hostname=<address>`.
    pub fn add_extra_client(&mut self, address: &str) -> Result<(), Error> {
        self.login()?;
        let _: StatusResponse = self.call_json("status", params(&[("hostname", address)]))?;
        Ok(())
    }

    /// Remove an extra client by the id reported in `get_extra_clients`.
    ///
    /// `status` action with `hostname=<id>&remove=true` -- the server
    /// reuses the hostname parameter for the numeric id on removal.
    pub fn remove_extra_client(&mut self, extra_client_id: i64) -> Result<(), Error> {
        self.login()?;
        let _: StatusResponse = self.call_json(
            "status",
            params(&[
                ("hostname", &extra_client_id.to_string()),
                ("remove", "true"),
            ]),
        )?;
        Ok(())
    }
}
