// Backup control and history
//
// Starting a backup resolves the client by name, then issues a typed
// `start_backup` request. The server acknowledges with a result list;
// anything but exactly one entry with a truthy `start_ok` counts as a
// refusal, never as partial success.

use crate::error::Error;
use crate::models::{BackupsResponse, FileBackup, ImageBackup, StartBackupResponse, StartType};
use crate::server::UrbackupServer;
use crate::transport::params;

impl UrbackupServer {
    fn start_backup(&mut self, clientname: &str, start_type: StartType) -> Result<(), Error> {
        let client = self.get_client_status(clientname)?;
        let answer: StartBackupResponse = self.call_json(
            "start_backup",
            params(&[
                ("start_client", &client.id.to_string()),
                ("start_type", start_type.as_str()),
            ]),
        )?;

        let Some(result) = answer.result else {
            return Err(Error::UnexpectedShape {
                action: "start_backup",
                field: "result",
            });
        };
        match result.as_slice() {
            [entry] if entry.start_ok == Some(true) => Ok(()),
            _ => Err(Error::BackupNotStarted {
                client: clientname.to_owned(),
                start_type,
            }),
        }
    }

    /// Start an incremental file backup for the named client.
    pub fn start_incr_file_backup(&mut self, clientname: &str) -> Result<(), Error> {
        self.start_backup(clientname, StartType::IncrFile)
    }

    /// Start a full file backup for the named client.
    pub fn start_full_file_backup(&mut self, clientname: &str) -> Result<(), Error> {
        self.start_backup(clientname, StartType::FullFile)
    }

    /// Start an incremental image backup for the named client.
    pub fn start_incr_image_backup(&mut self, clientname: &str) -> Result<(), Error> {
        self.start_backup(clientname, StartType::IncrImage)
    }

    /// Start a full image backup for the named client.
    pub fn start_full_image_backup(&mut self, clientname: &str) -> Result<(), Error> {
        self.start_backup(clientname, StartType::FullImage)
    }

    /// Historical file backups of one client.
    ///
    /// `backups` action, `sa=backups`.
    pub fn get_client_backups(&mut self, clientid: i64) -> Result<Vec<FileBackup>, Error> {
        self.login()?;
        let answer: BackupsResponse = self.call_json(
            "backups",
            params(&[("sa", "backups"), ("clientid", &clientid.to_string())]),
        )?;
        answer.backups.ok_or(Error::UnexpectedShape {
            action: "backups",
            field: "backups",
        })
    }

    /// Historical image backups of one client, one entry per volume.
    ///
    /// `backups` action, `sa=backups`, `backup_images` key.
    pub fn get_client_image_backups(&mut self, clientid: i64) -> Result<Vec<ImageBackup>, Error> {
        self.login()?;
        let answer: BackupsResponse = self.call_json(
            "backups",
            params(&[("sa", "backups"), ("clientid", &clientid.to_string())]),
        )?;
        answer.backup_images.ok_or(Error::UnexpectedShape {
            action: "backups",
            field: "backup_images",
        })
    }
}
