use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::SecondsFormat;
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::key::Key;
use gcloud_spanner::mutation::{delete, insert_or_update};
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use std::sync::Arc;

use super::ItemStore;
use crate::config::SpannerConfig;
use crate::item::Item;

const ITEMS_TABLE: &str = "items";

// Spanner purges rows whose expires_at has passed in the background; reads
// still filter because the purge can lag by days.
const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE items (
    path STRING(1024) NOT NULL,
    item JSON NOT NULL,
    expires_at TIMESTAMP,
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (path),
  ROW DELETION POLICY (OLDER_THAN(expires_at, INTERVAL 0 DAY))
"#;

/// Item store backed by a Cloud Spanner `items` table
///
/// Each row holds one serialized [`Item`]. `expires_at` mirrors the item's
/// validity: the read query skips rows past it and the table's row deletion
/// policy removes them.
#[derive(Clone)]
pub struct SpannerItemStore {
    inner: Arc<Client>,
}

impl SpannerItemStore {
    /// Connect to Spanner, provisioning the instance, database and table first
    ///
    /// `ClientConfig::default()` picks up `SPANNER_EMULATOR_HOST` on its own,
    /// so the same code path serves the emulator and production.
    ///
    /// # Errors
    /// Returns an error if provisioning fails or the client cannot connect
    pub async fn from_config(config: &SpannerConfig) -> Result<Self> {
        let provisioner = Provisioner::connect(config).await?;
        provisioner.run().await?;

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&provisioner.database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!("Connected to Spanner database: {}", provisioner.database_path);

        Ok(Self {
            inner: Arc::new(client),
        })
    }
}

/// `expires_at` column value, an RFC 3339 timestamp Spanner parses on write
fn expiry_timestamp(item: &Item) -> Option<String> {
    item.expires_at()
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[async_trait]
impl ItemStore for SpannerItemStore {
    /// Read the live item stored at exactly `path`
    ///
    /// # Arguments
    /// * `path` - Item path, compared exactly as given
    ///
    /// # Returns
    /// * `Ok(Some(item))` - Item found and not expired
    /// * `Ok(None)` - No row, or the row has expired but not yet been purged
    /// * `Err(_)` - Spanner operation failed
    ///
    /// # Errors
    /// Returns an error if the Spanner query fails or the stored JSON is not an item
    async fn read(&self, path: &str) -> Result<Option<Item>> {
        let mut statement = Statement::new(
            "SELECT item FROM items WHERE path = @path \
             AND (expires_at IS NULL OR expires_at > CURRENT_TIMESTAMP())",
        );
        statement.add_param("path", &path.to_string());

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query item from Spanner")?;

        match result_set.next().await? {
            Some(row) => {
                let raw: String = row.column_by_name("item")?;
                let item: Item = serde_json::from_str(&raw)
                    .with_context(|| format!("Stored item at {} is malformed", path))?;
                tracing::debug!("Read {} item at {}", item.type_name(), path);
                Ok(Some(item))
            }
            None => {
                tracing::debug!("No item at {}", path);
                Ok(None)
            }
        }
    }

    /// Insert or replace the row for `path`
    ///
    /// # Arguments
    /// * `path` - Item path used as the primary key
    /// * `item` - Validated item; its validity sets `expires_at`
    ///
    /// # Errors
    /// Returns an error if serialization or the Spanner mutation fails
    async fn write(&self, path: &str, item: &Item) -> Result<()> {
        let path_str = path.to_string();
        let item_str = serde_json::to_string(item)
            .context("Failed to serialize item")?;
        let expires_at = expiry_timestamp(item);

        let mutation = insert_or_update(
            ITEMS_TABLE,
            &["path", "item", "expires_at", "updated_at"],
            &[&path_str, &item_str, &expires_at, &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to write item to Spanner")?;

        tracing::debug!("Wrote {} item at {}", item.type_name(), path);
        Ok(())
    }

    /// Delete the row for `path`; a missing row is not an error
    ///
    /// # Errors
    /// Returns an error if the Spanner mutation fails
    async fn delete(&self, path: &str) -> Result<()> {
        let mutation = delete(ITEMS_TABLE, Key::new(&path.to_string()));

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to delete item from Spanner")?;

        tracing::debug!("Deleted item at {}", path);
        Ok(())
    }

    /// Runs `SELECT 1` to prove the session pool can reach the database
    ///
    /// # Returns
    /// * `Ok(())` - Database is reachable and responsive
    /// * `Err(_)` - Database connection failed or query failed
    async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

/// Creates whatever part of instance → database → `items` table is missing
struct Provisioner<'a> {
    admin: AdminClient,
    config: &'a SpannerConfig,
    project_path: String,
    instance_path: String,
    database_path: String,
}

/// Whether a `get_*` admin call found the resource
fn exists(lookup: std::result::Result<(), Status>, what: &str, name: &str) -> Result<bool> {
    match lookup {
        Ok(()) => {
            tracing::info!("{} already exists: {}", what, name);
            Ok(true)
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("{} not found, creating: {}", what, name);
            Ok(false)
        }
        Err(status) => Err(anyhow::anyhow!(
            "Failed to look up {} {}: {}",
            what.to_lowercase(),
            name,
            status.message()
        )),
    }
}

impl<'a> Provisioner<'a> {
    async fn connect(config: &'a SpannerConfig) -> Result<Self> {
        let admin = AdminClient::new(AdminClientConfig::default())
            .await
            .context("Failed to create Spanner admin client")?;

        let project_path = format!("projects/{}", config.project);
        let instance_path = format!("{}/instances/{}", project_path, config.instance);
        let database_path = format!("{}/databases/{}", instance_path, config.database);

        Ok(Self {
            admin,
            config,
            project_path,
            instance_path,
            database_path,
        })
    }

    async fn run(&self) -> Result<()> {
        tracing::info!("Checking Spanner resources for {}", self.database_path);

        self.instance().await?;
        // A new database is created with the table, so only an existing one
        // needs the DDL check.
        if self.database().await? {
            self.items_table().await?;
        }

        tracing::info!("Spanner resources ready");
        Ok(())
    }

    async fn instance(&self) -> Result<()> {
        let lookup = self
            .admin
            .instance()
            .get_instance(
                GetInstanceRequest {
                    name: self.instance_path.clone(),
                    field_mask: None,
                },
                None,
            )
            .await
            .map(|_| ());
        if exists(lookup, "Instance", &self.instance_path)? {
            return Ok(());
        }

        let instance_config = match self.config.emulator_host {
            Some(_) => "emulator-config",
            None => "regional-us-central1",
        };
        let request = CreateInstanceRequest {
            parent: self.project_path.clone(),
            instance_id: self.config.instance.clone(),
            instance: Some(Instance {
                name: self.instance_path.clone(),
                config: format!("{}/instanceConfigs/{}", self.project_path, instance_config),
                display_name: format!("{} instance", self.config.instance),
                node_count: 1,
                ..Default::default()
            }),
        };

        self.admin
            .instance()
            .create_instance(request, None)
            .await
            .context("Failed to start instance creation")?
            .wait(None)
            .await
            .context("Failed to create instance")?;

        tracing::info!("Instance created: {}", self.instance_path);
        Ok(())
    }

    /// Returns whether the database was already there
    async fn database(&self) -> Result<bool> {
        let lookup = self
            .admin
            .database()
            .get_database(
                GetDatabaseRequest {
                    name: self.database_path.clone(),
                },
                None,
            )
            .await
            .map(|_| ());
        if exists(lookup, "Database", &self.database_path)? {
            return Ok(true);
        }

        let request = CreateDatabaseRequest {
            parent: self.instance_path.clone(),
            create_statement: format!("CREATE DATABASE `{}`", self.config.database),
            extra_statements: vec![CREATE_ITEMS_TABLE.trim().to_string()],
            encryption_config: None,
            database_dialect: 1, // Google Standard SQL
            proto_descriptors: vec![],
        };

        self.admin
            .database()
            .create_database(request, None)
            .await
            .context("Failed to start database creation")?
            .wait(None)
            .await
            .context("Failed to create database")?;

        tracing::info!("Database created with {} table: {}", ITEMS_TABLE, self.database_path);
        Ok(false)
    }

    async fn items_table(&self) -> Result<()> {
        let ddl = self
            .admin
            .database()
            .get_database_ddl(
                GetDatabaseDdlRequest {
                    database: self.database_path.clone(),
                },
                None,
            )
            .await
            .context("Failed to get database DDL")?
            .into_inner();

        if ddl.statements.iter().any(|stmt| declares_items_table(stmt)) {
            tracing::info!("Table '{}' already exists", ITEMS_TABLE);
            return Ok(());
        }

        tracing::info!("Table '{}' not found, creating...", ITEMS_TABLE);

        let request = UpdateDatabaseDdlRequest {
            database: self.database_path.clone(),
            statements: vec![CREATE_ITEMS_TABLE.trim().to_string()],
            operation_id: String::new(),
            proto_descriptors: vec![],
            throughput_mode: false,
        };

        self.admin
            .database()
            .update_database_ddl(request, None)
            .await
            .context("Failed to start table creation")?
            .wait(None)
            .await
            .context("Failed to create table")?;

        tracing::info!("Table '{}' created", ITEMS_TABLE);
        Ok(())
    }
}

fn declares_items_table(statement: &str) -> bool {
    statement.contains("CREATE TABLE items") || statement.contains("CREATE TABLE `items`")
}
