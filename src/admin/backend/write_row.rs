impl TableConfigBackend {
    /// Creates, updates or deletes the table whose row is keyed by `primary_key`.
    ///
    /// `new_value` holds the proposed row, or `None` to delete. After a
    /// successful create or update it is replaced by the stored row, which
    /// includes any defaulted `primary_key` and generated `shards`.
    ///
    /// All changes are made on a private copy of the metadata and joined into
    /// the shared map in one step at the end; an error or cancellation leaves
    /// the shared map untouched.
    ///
    /// # Panics
    ///
    /// When the caller breaks its contract: an auto-generated key that is not
    /// a UUID, a row whose `id` differs from the key, or an auto-generated key
    /// that collides with an existing or deleted table.
    pub async fn write_row(
        &self,
        primary_key: &Value,
        pkey_was_autogenerated: bool,
        new_value: &mut Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let span = info_span!(
            "table_config_write",
            key = %primary_key,
            autogenerated = pkey_was_autogenerated,
            delete = new_value.is_none()
        );
        let result = self
            .write_row_in_span(primary_key, pkey_was_autogenerated, new_value, cancel)
            .instrument(span.clone())
            .await;
        if let Err(err) = &result {
            span.in_scope(|| match err {
                AdminError::Interrupted => event!(Level::DEBUG, "table config write interrupted"),
                other => event!(Level::INFO, error = %other, "table config write rejected"),
            });
        }
        result
    }

    async fn write_row_in_span(
        &self,
        primary_key: &Value,
        pkey_was_autogenerated: bool,
        new_value: &mut Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_interrupted(cancel)?;

        let mut tables = self.tables.get()?;
        let table_id = match uuid_from_value(primary_key) {
            Ok(uuid) => TableId::from_uuid(uuid),
            Err(_) => {
                assert!(
                    !pkey_was_autogenerated,
                    "auto-generated primary key should have been a valid UUID string."
                );
                TableId::nil()
            }
        };
        let existed_before = tables.active(&table_id).is_some();

        let Some(row) = new_value.as_ref() else {
            if existed_before {
                assert!(!pkey_was_autogenerated, "UUID collision happened");
                tables.mark_deleted(&table_id);
                check_interrupted(cancel)?;
                self.tables.join(&tables)?;
                event!(Level::INFO, table_id = %table_id, "table config deleted");
            } else {
                event!(Level::DEBUG, "delete of missing table is a no-op");
            }
            return Ok(());
        };

        let (update, config) = self
            .decode_row(row, existed_before, &tables, cancel)
            .await?;
        assert_eq!(
            update.id, table_id,
            "the `id` of a table_config row must match its primary key"
        );

        if existed_before {
            assert!(!pkey_was_autogenerated, "UUID collision happened");
        } else {
            if !pkey_was_autogenerated {
                return Err(AdminError::Illegal(
                    "If you want to create a new table by inserting into `table_config`, you must use an auto-generated primary key.".to_string(),
                ));
            }
            // A random id must not resurrect a table that used to exist.
            assert!(!tables.contains(&table_id), "UUID collision happened");
        }

        // For an existing table the `db` field is compared in display form,
        // so a renamed or deleted database does not break unrelated updates.
        let db_id = match tables.active(&table_id) {
            Some(existing) => {
                let stored = *existing.database.get();
                let shown = self
                    .resolver
                    .database_to_value(stored, self.config.identifier_format);
                if update.db != shown {
                    return Err(AdminError::Illegal(
                        "It's illegal to change a table's `database` field.".to_string(),
                    ));
                }
                if &update.primary_key != existing.primary_key.get() {
                    return Err(AdminError::Illegal(
                        "It's illegal to change a table's primary key.".to_string(),
                    ));
                }
                stored
            }
            None => {
                check_interrupted(cancel)?;
                self.resolver
                    .database_from_value(&update.db, self.config.identifier_format)
                    .map_err(|err| AdminError::Database(err.to_string()))?
            }
        };

        let shard_scheme = match tables.active(&table_id) {
            Some(existing) => {
                self.split_points
                    .recalculate(
                        table_id,
                        config.shards.len(),
                        existing.replication_info.get(),
                        cancel,
                    )
                    .await?
            }
            None => {
                if config.shards.len() != 1 {
                    return Err(AdminError::Illegal(
                        "Newly created tables must start with exactly one shard".to_string(),
                    ));
                }
                ShardScheme::one_shard()
            }
        };
        let replication_info = TableReplicationInfo {
            config,
            shard_scheme,
        };

        let old_name = tables.active(&table_id).map(|t| t.name.get().clone());
        if old_name.as_deref() != Some(update.name.as_str()) {
            let collision = tables
                .find_by_name(db_id, &update.name)
                .into_iter()
                .any(|other| other != table_id);
            if collision {
                let db_name = display_value(&update.db);
                return Err(AdminError::NameCollision(match old_name {
                    None => format!("Table `{}.{}` already exists.", db_name, update.name),
                    Some(old_name) => format!(
                        "Cannot rename table `{db}.{old}` to `{db}.{new}` because table `{db}.{new}` already exists.",
                        db = db_name,
                        old = old_name,
                        new = update.name
                    ),
                }));
            }
        }

        match tables.active_mut(&table_id) {
            Some(existing) => {
                if existing.name.get() != &update.name {
                    existing.name.set(update.name.clone(), &self.clock);
                }
                if existing.replication_info.get() != &replication_info {
                    existing.replication_info.set(replication_info, &self.clock);
                }
            }
            None => {
                tables.insert_active(
                    table_id,
                    TableMetadata::new(
                        update.name.clone(),
                        db_id,
                        update.primary_key.clone(),
                        replication_info,
                        &self.clock,
                    ),
                );
            }
        }

        check_interrupted(cancel)?;
        self.tables.join(&tables)?;
        event!(
            Level::INFO,
            table_id = %table_id,
            created = !existed_before,
            "table config committed"
        );

        if let Some(stored) = tables.active(&table_id) {
            *new_value = Some(format_row(
                table_id,
                stored.name.get(),
                update.db,
                stored,
                self.config.identifier_format,
                self.resolver.as_ref(),
            ));
        }
        Ok(())
    }

    /// Decodes the proposed row and, for a new table without `shards`, asks
    /// the placement generator for an initial single-shard configuration.
    async fn decode_row(
        &self,
        row: &Value,
        existed_before: bool,
        tables: &TablesMetadata,
        cancel: &CancellationToken,
    ) -> Result<(TableRowUpdate, TableConfig)> {
        check_interrupted(cancel)?;
        let mut update = decode_table_row(
            row,
            existed_before,
            self.config.identifier_format,
            self.resolver.as_ref(),
        )
        .map_err(|err| AdminError::Format(err.to_string()))?;

        let config = match update.shards.take() {
            Some(config) => config,
            None => {
                let mut usage = ServerUsage::new();
                for (_, table) in tables.active_tables() {
                    calculate_server_usage(&table.replication_info.get().config, &mut usage);
                }
                self.generator
                    .generate(
                        self.resolver.as_ref(),
                        &usage,
                        &self.config.generation,
                        &ShardScheme::one_shard(),
                        cancel,
                    )
                    .await?
            }
        };
        Ok((update, config))
    }
}
