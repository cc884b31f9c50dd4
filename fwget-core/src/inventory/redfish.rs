//! Redfish firmware inventory client
//!
//! Talks to a management controller (iLO) over its Redfish REST API:
//!
//! ```text
//! POST   /redfish/v1/SessionService/Sessions/        → X-Auth-Token, Location
//! GET    /redfish/v1/UpdateService/FirmwareInventory/ → Members[]
//! GET    <member @odata.id>                           → one firmware item
//! DELETE <Location>                                   → end the session
//! ```
//!
//! Requests are issued one at a time. A failed item fetch aborts the whole
//! inventory; a partial inventory is never returned.

use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use super::{ExportFormat, Inventory, InventoryEntry};
use crate::config::IloCredentials;
use crate::error::{FwgetError, Result};

pub const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions/";
pub const FIRMWARE_INVENTORY_PATH: &str = "/redfish/v1/UpdateService/FirmwareInventory/";

/// JSON pointer to the vendor target list inside a firmware item
pub const TARGETS_POINTER: &str = "/Oem/Hpe/Targets";

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one controller
pub struct RedfishClient {
    client: reqwest::Client,
    base: String,
}

/// An authenticated Redfish session
///
/// Call [`Session::logout`] when done; controllers allow only a few
/// concurrent sessions.
pub struct Session<'a> {
    client: &'a RedfishClient,
    token: String,
    location: Option<String>,
}

impl RedfishClient {
    /// `address` may be a bare host name or IP; `https://` is assumed then
    pub fn new(address: &str, insecure: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fwget/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| FwgetError::TransportFailure {
                url: address.to_string(),
                status: None,
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base: normalize_address(address),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base, path.trim_start_matches('/'))
        }
    }

    /// Open a session with username and password
    pub async fn login(&self, username: &str, password: &str) -> Result<Session<'_>> {
        let url = self.url_for(SESSIONS_PATH);
        tracing::debug!("Opening Redfish session at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "UserName": username, "Password": password }))
            .send()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwgetError::from_status(url, status.as_u16()));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        let token = header(AUTH_TOKEN_HEADER)
            .ok_or_else(|| FwgetError::malformed("session response", "no X-Auth-Token header"))?;
        let mut location = header("Location");

        if location.is_none() {
            // Some firmware only reports the session resource in the body
            let body: Value = response.json().await.unwrap_or(Value::Null);
            location = body
                .get("@odata.id")
                .and_then(Value::as_str)
                .map(String::from);
        }

        Ok(Session {
            client: self,
            token,
            location,
        })
    }
}

impl Session<'_> {
    /// Enumerate every firmware item, in the order the controller lists them
    pub async fn firmware_inventory(&self) -> Result<Inventory> {
        let collection = self.get_json(FIRMWARE_INVENTORY_PATH).await?;
        let members = member_paths(&collection)?;
        let total = members.len();
        tracing::debug!("Firmware inventory lists {} items", total);

        let mut entries = Vec::with_capacity(total);
        for (fetched, member) in members.iter().enumerate() {
            let entry = match self.get_json(member).await {
                Ok(item) => parse_firmware_item(&item),
                Err(e) => Err(e),
            };

            match entry {
                Ok(entry) => entries.push(entry),
                Err(source) => {
                    return Err(FwgetError::PartialInventory {
                        member: member.clone(),
                        fetched,
                        total,
                        source: Box::new(source),
                    })
                }
            }
        }

        Inventory::new(entries)
    }

    /// End the session
    pub async fn logout(self) -> Result<()> {
        let Some(location) = &self.location else {
            tracing::warn!("Session has no resource location; it will expire on its own");
            return Ok(());
        };

        let url = self.client.url_for(location);
        let response = self
            .client
            .client
            .delete(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwgetError::from_status(url, status.as_u16()));
        }
        tracing::debug!("Closed Redfish session {}", location);
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.client.url_for(path);

        let response = self
            .client
            .client
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwgetError::from_status(url, status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FwgetError::malformed(format!("response from {url}"), e))
    }
}

/// Log in, read the firmware inventory and log out again
///
/// Logout failures are logged but do not discard an inventory that was read
/// successfully.
pub async fn collect_inventory(credentials: &IloCredentials) -> Result<Inventory> {
    let client = RedfishClient::new(&credentials.address, credentials.insecure)?;
    let session = client
        .login(&credentials.username, &credentials.password)
        .await?;

    let inventory = session.firmware_inventory().await;

    if let Err(e) = session.logout().await {
        tracing::warn!("Failed to close Redfish session: {}", e);
    }

    let inventory = inventory?;
    tracing::info!(
        "Read {} firmware items from {}",
        inventory.len(),
        client.base_url()
    );
    Ok(inventory)
}

/// Collect, render and write the inventory to `path`
///
/// The file is only created after the inventory is complete and rendered.
pub async fn export_to_file(
    credentials: &IloCredentials,
    format: ExportFormat,
    path: &Path,
) -> Result<usize> {
    let inventory = collect_inventory(credentials).await?;
    let rendered = inventory.export(format)?;

    std::fs::write(path, rendered).map_err(|e| FwgetError::io(path, e))?;
    tracing::info!("Wrote {} inventory to {}", format, path.display());
    Ok(inventory.len())
}

fn normalize_address(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("https://{address}")
    }
}

fn member_paths(collection: &Value) -> Result<Vec<String>> {
    let members = collection
        .get("Members")
        .and_then(Value::as_array)
        .ok_or_else(|| FwgetError::malformed("firmware inventory", "no Members array"))?;

    members
        .iter()
        .map(|member| {
            member
                .get("@odata.id")
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| FwgetError::malformed("firmware inventory", "member without @odata.id"))
        })
        .collect()
}

fn parse_firmware_item(item: &Value) -> Result<InventoryEntry> {
    let field = |name: &str| -> Result<String> {
        item.get(name)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                FwgetError::malformed("firmware item", format!("missing string field '{name}'"))
            })
    };

    let odata_id = field("@odata.id")?;

    let targets = match item.pointer(TARGETS_POINTER) {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .map(|v| {
                    v.as_str().map(String::from).ok_or_else(|| {
                        FwgetError::malformed(
                            format!("firmware item '{odata_id}'"),
                            "non-string target id",
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => {
            return Err(FwgetError::malformed(
                format!("firmware item '{odata_id}'"),
                "target list is not an array",
            ))
        }
    };

    Ok(InventoryEntry {
        description: field("Description")?,
        name: field("Name")?,
        odata_id,
        targets,
        version: field("Version")?,
    })
}

#[cfg(test)]
mod redfish_tests {
    use super::*;
    use crate::ErrorKind;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    const SESSION_LOCATION: &str = "/redfish/v1/SessionService/Sessions/admin0001/";

    fn credentials(server: &ServerGuard) -> IloCredentials {
        IloCredentials {
            address: server.url(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            insecure: false,
        }
    }

    async fn mock_login(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", SESSIONS_PATH)
            .match_body(Matcher::Json(json!({"UserName": "admin", "Password": "secret"})))
            .with_status(201)
            .with_header("X-Auth-Token", "tok123")
            .with_header("Location", SESSION_LOCATION)
            .with_body("{}")
            .create_async()
            .await
    }

    async fn mock_logout(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("DELETE", SESSION_LOCATION)
            .match_header("x-auth-token", "tok123")
            .with_status(200)
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_collection(server: &mut ServerGuard, count: usize) -> mockito::Mock {
        let members: Vec<Value> = (1..=count)
            .map(|i| json!({"@odata.id": format!("{FIRMWARE_INVENTORY_PATH}{i}/")}))
            .collect();
        server
            .mock("GET", FIRMWARE_INVENTORY_PATH)
            .match_header("x-auth-token", "tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"Members": members}).to_string())
            .create_async()
            .await
    }

    async fn mock_item(server: &mut ServerGuard, i: usize, body: Value) -> mockito::Mock {
        server
            .mock("GET", format!("{FIRMWARE_INVENTORY_PATH}{i}/").as_str())
            .match_header("x-auth-token", "tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    fn item_body(i: usize, targets: Option<Vec<&str>>) -> Value {
        let mut body = json!({
            "@odata.id": format!("{FIRMWARE_INVENTORY_PATH}{i}/"),
            "Name": format!("Item {i}"),
            "Description": format!("Description {i}"),
            "Version": format!("1.{i}"),
        });
        if let Some(targets) = targets {
            body["Oem"] = json!({"Hpe": {"Targets": targets}});
        }
        body
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("10.0.0.5"), "https://10.0.0.5");
        assert_eq!(normalize_address("http://ilo.local/"), "http://ilo.local");
    }

    #[test]
    fn test_parse_firmware_item() {
        let entry = parse_firmware_item(&item_body(1, Some(vec!["b", "a", "b"]))).unwrap();
        assert_eq!(entry.name, "Item 1");
        assert_eq!(entry.version, "1.1");
        // Order and repeats preserved
        assert_eq!(
            entry.targets,
            Some(vec!["b".to_string(), "a".to_string(), "b".to_string()])
        );

        let entry = parse_firmware_item(&item_body(2, None)).unwrap();
        assert_eq!(entry.targets, None);

        let mut missing = item_body(3, None);
        missing.as_object_mut().unwrap().remove("Version");
        assert!(parse_firmware_item(&missing).is_err());
    }

    #[tokio::test]
    async fn test_collect_inventory() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _collection = mock_collection(&mut server, 2).await;
        let _item1 = mock_item(&mut server, 1, item_body(1, Some(vec!["t-1", "t-2"]))).await;
        let _item2 = mock_item(&mut server, 2, item_body(2, None)).await;
        let logout = mock_logout(&mut server).await;

        let inventory = collect_inventory(&credentials(&server)).await.unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(
            inventory.entries()[0].odata_id,
            "/redfish/v1/UpdateService/FirmwareInventory/1/"
        );
        assert_eq!(inventory.target_ids(), vec!["t-1", "t-2"]);

        logout.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_item_aborts_inventory() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _collection = mock_collection(&mut server, 3).await;
        let _item1 = mock_item(&mut server, 1, item_body(1, None)).await;
        let _item2 = server
            .mock("GET", format!("{FIRMWARE_INVENTORY_PATH}2/").as_str())
            .with_status(500)
            .create_async()
            .await;
        let _item3 = mock_item(&mut server, 3, item_body(3, None)).await;
        let logout = mock_logout(&mut server).await;

        let err = collect_inventory(&credentials(&server)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartialInventory);
        assert_eq!(err.status(), Some(500));
        match &err {
            FwgetError::PartialInventory {
                member,
                fetched,
                total,
                ..
            } => {
                assert!(member.ends_with("/2/"));
                assert_eq!(*fetched, 1);
                assert_eq!(*total, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The session is still closed
        logout.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", SESSIONS_PATH)
            .with_status(401)
            .create_async()
            .await;

        let err = collect_inventory(&credentials(&server)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_export_to_file_not_written_on_failure() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _collection = mock_collection(&mut server, 2).await;
        let _item1 = mock_item(&mut server, 1, item_body(1, None)).await;
        let _item2 = server
            .mock("GET", format!("{FIRMWARE_INVENTORY_PATH}2/").as_str())
            .with_status(404)
            .create_async()
            .await;
        let _logout = mock_logout(&mut server).await;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("inventory.json");

        let err = export_to_file(&credentials(&server), ExportFormat::Json, &output)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartialInventory);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_export_to_file_spaced() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _collection = mock_collection(&mut server, 1).await;
        let _item1 = mock_item(&mut server, 1, item_body(1, Some(vec!["abc"]))).await;
        let _logout = mock_logout(&mut server).await;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("inventory.txt");

        let count = export_to_file(&credentials(&server), ExportFormat::Spaced, &output)
            .await
            .unwrap();

        assert_eq!(count, 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("odataId:/redfish/v1/UpdateService/FirmwareInventory/1/\n"));
        assert!(text.ends_with("targets:abc\n"));
    }
}
