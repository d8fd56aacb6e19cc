//! Builtin catalog of the college site's content types.

use crate::config::types::*;
use crate::media::{FileNaming, MediaKind};

fn col(name: &str, kind: ColumnKind, required: bool) -> ColumnConfig {
    ColumnConfig {
        name: name.to_string(),
        kind,
        required,
    }
}

fn text(name: &str) -> ColumnConfig {
    col(name, ColumnKind::Text, false)
}

fn required(name: &str) -> ColumnConfig {
    col(name, ColumnKind::Text, true)
}

fn long(name: &str) -> ColumnConfig {
    col(name, ColumnKind::LongText, false)
}

fn image(folder: &str, required: bool) -> Option<UploadSlotConfig> {
    Some(UploadSlotConfig {
        kind: MediaKind::Image,
        folder: folder.to_string(),
        url_column: "image_url".into(),
        key_column: "image_key".into(),
        naming: FileNaming::Opaque,
        required,
    })
}

fn document(folder: &str) -> Option<UploadSlotConfig> {
    Some(UploadSlotConfig {
        kind: MediaKind::Document,
        folder: folder.to_string(),
        url_column: "document_url".into(),
        key_column: "document_key".into(),
        naming: FileNaming::Sanitized,
        required: false,
    })
}

fn resource(
    path_segment: &str,
    columns: Vec<ColumnConfig>,
    order: SortOrder,
    upload: Option<UploadSlotConfig>,
) -> ResourceConfig {
    ResourceConfig {
        path_segment: path_segment.to_string(),
        table: None,
        columns,
        order,
        upload,
    }
}

fn family(key: &str, table_prefix: &str, file_suffix: &str) -> FamilyConfig {
    FamilyConfig {
        key: key.to_string(),
        tab_table: format!("{}_tabs", table_prefix),
        section_table: format!("{}_sections", table_prefix),
        file_table: format!("{}_{}", table_prefix, file_suffix),
        folder: key.to_string(),
    }
}

pub fn builtin_catalog() -> CatalogConfig {
    use SortOrder::{Asc, Desc};
    CatalogConfig {
        resources: vec![
            resource("links", vec![required("title"), required("url")], Desc, None),
            resource(
                "institutes",
                vec![required("name"), long("description"), text("website")],
                Asc,
                image("institutes", false),
            ),
            resource("committees", vec![required("name"), long("description")], Asc, document("committees")),
            resource(
                "admissions",
                vec![required("title"), long("description"), text("academic_year")],
                Desc,
                document("admissions"),
            ),
            resource("mandates", vec![required("title"), long("description")], Desc, document("mandates")),
            resource(
                "events",
                vec![required("title"), long("description"), col("event_date", ColumnKind::Date, false)],
                Desc,
                image("events", false),
            ),
            resource(
                "sliders",
                vec![text("caption"), col("sort_order", ColumnKind::Integer, false)],
                Asc,
                image("sliders", true),
            ),
            resource(
                "staff",
                vec![
                    required("name"),
                    required("designation"),
                    text("department"),
                    text("qualification"),
                    text("email"),
                    text("phone"),
                ],
                Asc,
                image("staff", false),
            ),
            resource(
                "authorities",
                vec![required("name"), required("designation"), long("message")],
                Asc,
                image("authorities", false),
            ),
            resource(
                "contact_info",
                vec![required("address"), text("phone"), text("email"), text("map_url")],
                Asc,
                None,
            ),
            resource("galleries", vec![required("title"), text("caption")], Desc, image("galleries", true)),
            resource(
                "principal",
                vec![required("name"), long("message"), text("qualification")],
                Asc,
                image("principal", false),
            ),
            resource("inspiration", vec![required("name"), long("message")], Asc, image("inspiration", false)),
            resource(
                "notices",
                vec![required("title"), col("notice_date", ColumnKind::Date, false), text("link")],
                Desc,
                document("notices"),
            ),
            resource(
                "hospital_info",
                vec![required("title"), long("description")],
                Asc,
                image("hospital", false),
            ),
        ],
        families: vec![
            family("ncism", "ncism", "pdfs"),
            family("muhs", "muhs", "pdfs"),
            family("hospital", "hospital", "files"),
            family("departments", "department", "files"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_follow_table_layout() {
        let catalog = builtin_catalog();
        let ncism = catalog.families.iter().find(|f| f.key == "ncism").unwrap();
        assert_eq!(ncism.tab_table, "ncism_tabs");
        assert_eq!(ncism.section_table, "ncism_sections");
        assert_eq!(ncism.file_table, "ncism_pdfs");
        let departments = catalog.families.iter().find(|f| f.key == "departments").unwrap();
        assert_eq!(departments.file_table, "department_files");
        assert_eq!(departments.folder, "departments");
    }

    #[test]
    fn builtin_catalog_is_valid() {
        crate::config::validate(&builtin_catalog()).unwrap();
    }
}
