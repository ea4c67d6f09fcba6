impl TableConfigBackend {
    /// Returns the row for `primary_key`, or `None` if it names no live table.
    pub fn read_row(
        &self,
        primary_key: &Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        check_interrupted(cancel)?;
        let Ok(uuid) = uuid_from_value(primary_key) else {
            return Ok(None);
        };
        let table_id = TableId::from_uuid(uuid);
        let tables = self.tables.get()?;
        match tables.active(&table_id) {
            Some(table) => self.format_table(table_id, table, cancel).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the rows of every live table, ordered by table id.
    pub fn read_all_rows(&self, cancel: &CancellationToken) -> Result<Vec<Value>> {
        check_interrupted(cancel)?;
        let tables = self.tables.get()?;
        tables
            .active_tables()
            .map(|(table_id, table)| self.format_table(*table_id, table, cancel))
            .collect()
    }

    /// Builds one row from already-resolved parts.
    pub fn format_row(
        &self,
        table_id: TableId,
        table_name: &str,
        db: Value,
        metadata: &TableMetadata,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        check_interrupted(cancel)?;
        Ok(format_row(
            table_id,
            table_name,
            db,
            metadata,
            self.config.identifier_format,
            self.resolver.as_ref(),
        ))
    }

    fn format_table(
        &self,
        table_id: TableId,
        table: &TableMetadata,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let db = self
            .resolver
            .database_to_value(*table.database.get(), self.config.identifier_format);
        self.format_row(table_id, table.name.get(), db, table, cancel)
    }
}
