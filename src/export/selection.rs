//! Derivation of the applicable service set.

use crate::model::ServiceInstance;

/// Services applicable to the chosen component types.
///
/// One pass over the full instance collection, accumulating every instance
/// whose type equals any chosen type name. This is a concatenation, not a
/// union: an instance is appended once per matching chosen entry and nothing
/// is deduplicated. Downstream consumers may depend on order or duplication,
/// so this is kept exactly as-is.
pub fn applicable_services(chosen_types: &[String], instances: &[ServiceInstance]) -> Vec<String> {
    let mut names = Vec::new();
    for instance in instances {
        for service_type in chosen_types {
            if instance.service_type == *service_type {
                names.push(instance.name.clone());
            }
        }
    }
    names
}

/// Services of a single fixed type, for dialogs scoped to one component.
pub fn services_of_type(service_type: &str, instances: &[ServiceInstance]) -> Vec<String> {
    instances
        .iter()
        .filter(|instance| instance.service_type == service_type)
        .map(|instance| instance.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances() -> Vec<ServiceInstance> {
        vec![
            ServiceInstance::new("a1", "HDFS"),
            ServiceInstance::new("a2", "HIVE"),
            ServiceInstance::new("a3", "HDFS"),
        ]
    }

    #[test]
    fn single_type_keeps_catalog_order() {
        let names = applicable_services(&["HDFS".to_string()], &instances());
        assert_eq!(names, vec!["a1", "a3"]);
    }

    #[test]
    fn both_types_accumulate_in_catalog_order() {
        let names = applicable_services(
            &["HDFS".to_string(), "HIVE".to_string()],
            &instances(),
        );
        assert_eq!(names, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn repeated_chosen_entries_duplicate_matches() {
        // Concatenation, not union: one append per matching chosen entry.
        let names = applicable_services(
            &["HDFS".to_string(), "HDFS".to_string()],
            &instances(),
        );
        assert_eq!(names, vec!["a1", "a1", "a3", "a3"]);
    }

    #[test]
    fn no_chosen_types_yields_no_services() {
        assert!(applicable_services(&[], &instances()).is_empty());
    }

    #[test]
    fn fixed_type_derivation() {
        assert_eq!(services_of_type("HIVE", &instances()), vec!["a2"]);
        assert!(services_of_type("HBASE", &instances()).is_empty());
    }
}
