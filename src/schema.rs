//! Static table definitions for the warehouse resources.
//!
//! The SQL accessor only ever takes identifiers from here; field paths in
//! requests are looked up against `columns` and `relations` and never
//! interpolated. Column paths are the camelCase keys of the API records and
//! must match the tables created by `migrations/`.

/// How a column's values are bound and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Numeric,
    Bool,
    Timestamp,
    Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Key in API records
    pub path: &'static str,
    /// Column name in SQL
    pub sql: &'static str,
    pub kind: ColumnKind,
}

/// Many-to-one link from `local_column` to the target's `foreign_column`.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub target: &'static TableSchema,
    pub local_column: &'static str,
    pub foreign_column: &'static str,
}

#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    /// API path of the primary key column
    pub primary_key: &'static str,
    pub columns: &'static [Column],
    pub relations: &'static [Relation],
}

impl TableSchema {
    pub fn column(&self, path: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.path == path)
    }

    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn primary_key_column(&self) -> Option<&'static Column> {
        self.column(self.primary_key)
    }
}

const fn col(path: &'static str, sql: &'static str, kind: ColumnKind) -> Column {
    Column { path, sql, kind }
}

const fn belongs_to(
    name: &'static str,
    target: &'static TableSchema,
    local_column: &'static str,
) -> Relation {
    Relation {
        name,
        target,
        local_column,
        foreign_column: "id",
    }
}

use ColumnKind::*;

pub static USERS: TableSchema = TableSchema {
    table: "users",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("firstName", "first_name", Text),
        col("lastName", "last_name", Text),
        col("email", "email", Text),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[],
};

pub static CUSTOMERS: TableSchema = TableSchema {
    table: "customers",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("name", "name", Text),
        col("email", "email", Text),
        col("phone", "phone", Text),
        col("customerType", "customer_type", Text),
        col("companyName", "company_name", Text),
        col("taxNumber", "tax_number", Text),
        col("createdById", "created_by", Integer),
        col("createdAt", "created_at", Timestamp),
        col("updatedAt", "updated_at", Timestamp),
    ],
    relations: &[belongs_to("creator", &USERS, "created_by")],
};

pub static SUPPLIERS: TableSchema = TableSchema {
    table: "suppliers",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("name", "name", Text),
        col("contactEmail", "contact_email", Text),
        col("phone", "phone", Text),
        col("country", "country", Text),
        col("createdById", "created_by", Integer),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[belongs_to("creator", &USERS, "created_by")],
};

pub static PRODUCTS: TableSchema = TableSchema {
    table: "products",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("sku", "sku", Text),
        col("name", "name", Text),
        col("description", "description", Text),
        col("unitPrice", "unit_price", Numeric),
        col("active", "active", Bool),
        col("supplierId", "supplier_id", Integer),
        col("createdById", "created_by", Integer),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[
        belongs_to("supplier", &SUPPLIERS, "supplier_id"),
        belongs_to("creator", &USERS, "created_by"),
    ],
};

pub static WAREHOUSES: TableSchema = TableSchema {
    table: "warehouses",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("code", "code", Text),
        col("name", "name", Text),
        col("city", "city", Text),
        col("capacity", "capacity", Integer),
        col("createdById", "created_by", Integer),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[belongs_to("creator", &USERS, "created_by")],
};

pub static BINS: TableSchema = TableSchema {
    table: "bins",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("code", "code", Text),
        col("zone", "zone", Text),
        col("capacity", "capacity", Integer),
        col("warehouseId", "warehouse_id", Integer),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[belongs_to("warehouse", &WAREHOUSES, "warehouse_id")],
};

pub static CYCLE_COUNTS: TableSchema = TableSchema {
    table: "cycle_counts",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("reference", "reference", Uuid),
        col("binId", "bin_id", Integer),
        col("productId", "product_id", Integer),
        col("countedById", "counted_by", Integer),
        col("expectedQuantity", "expected_quantity", Integer),
        col("countedQuantity", "counted_quantity", Integer),
        col("status", "status", Text),
        col("countedAt", "counted_at", Timestamp),
    ],
    relations: &[
        belongs_to("bin", &BINS, "bin_id"),
        belongs_to("product", &PRODUCTS, "product_id"),
        belongs_to("counter", &USERS, "counted_by"),
    ],
};

pub static NOTIFICATIONS: TableSchema = TableSchema {
    table: "notifications",
    primary_key: "id",
    columns: &[
        col("id", "id", Integer),
        col("recipientId", "recipient_id", Integer),
        col("title", "title", Text),
        col("body", "body", Text),
        col("read", "read", Bool),
        col("createdAt", "created_at", Timestamp),
    ],
    relations: &[belongs_to("recipient", &USERS, "recipient_id")],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> [&'static TableSchema; 8] {
        [
            &USERS,
            &CUSTOMERS,
            &SUPPLIERS,
            &PRODUCTS,
            &WAREHOUSES,
            &BINS,
            &CYCLE_COUNTS,
            &NOTIFICATIONS,
        ]
    }

    #[test]
    fn test_every_table_has_its_primary_key() {
        for schema in all() {
            assert!(schema.primary_key_column().is_some(), "{}", schema.table);
        }
    }

    #[test]
    fn test_relations_point_at_existing_columns() {
        for schema in all() {
            for relation in schema.relations {
                assert!(
                    schema.columns.iter().any(|c| c.sql == relation.local_column),
                    "{}.{}",
                    schema.table,
                    relation.local_column
                );
                assert!(
                    relation
                        .target
                        .columns
                        .iter()
                        .any(|c| c.sql == relation.foreign_column),
                    "{} -> {}",
                    schema.table,
                    relation.target.table
                );
            }
        }
    }

    #[test]
    fn test_lookup_by_path() {
        assert_eq!(PRODUCTS.column("unitPrice").map(|c| c.kind), Some(Numeric));
        assert_eq!(CYCLE_COUNTS.relation("bin").map(|r| r.target.table), Some("bins"));
        assert!(PRODUCTS.column("unit_price").is_none());
    }
}
