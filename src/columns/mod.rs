use crate::fetch::Row;
use crate::query::SortDirection;

pub type CellRenderer = fn(&Row, &str) -> String;

/// Static description of one table column.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    /// First header click sorts descending instead of ascending.
    pub sort_desc_first: bool,
    /// Header clicks never return the column to unsorted.
    pub always_sorted: bool,
    pub hidden: bool,
    pub render: CellRenderer,
}

impl ColumnDescriptor {
    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
            sort_desc_first: false,
            always_sorted: false,
            hidden: false,
            render: render_field,
        }
    }

    pub fn numeric(key: &'static str, label: &'static str) -> Self {
        Self {
            sort_desc_first: true,
            ..Self::text(key, label)
        }
    }

    pub fn first_direction(&self) -> SortDirection {
        if self.sort_desc_first {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn render(&self, row: &Row) -> String {
        (self.render)(row, self.key)
    }
}

pub fn render_field(row: &Row, key: &str) -> String {
    row.display(key)
}

fn render_count(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(serde_json::Value::Null) | None => "0".to_string(),
        Some(_) => row.display(key),
    }
}

/// The ranked landlord listing as shown on the public site.
pub fn landlord_columns() -> Vec<ColumnDescriptor> {
    let count = |key, label| ColumnDescriptor {
        always_sorted: true,
        render: render_count as CellRenderer,
        ..ColumnDescriptor::numeric(key, label)
    };
    vec![
        ColumnDescriptor {
            always_sorted: true,
            ..ColumnDescriptor::text("name", "Name")
        },
        ColumnDescriptor {
            always_sorted: true,
            ..ColumnDescriptor::text("address", "Address")
        },
        ColumnDescriptor {
            hidden: true,
            ..ColumnDescriptor::text("id", "ID")
        },
        count("tenant_complaints_count", "Tenant Complaints"),
        count("property_count", "Property Count"),
        count("code_violations_count", "Code Violations Count"),
        count("police_incidents_count", "Police Incidents Count"),
        count("eviction_count", "Eviction Count"),
        ColumnDescriptor {
            always_sorted: true,
            ..ColumnDescriptor::numeric("grade", "Grade")
        },
    ]
}

pub fn find<'a>(columns: &'a [ColumnDescriptor], key: &str) -> Option<&'a ColumnDescriptor> {
    let key = key.trim();
    columns
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(key) || c.label.eq_ignore_ascii_case(key))
}
