//! Which produced elements the Diff Reader may surface.

use crate::model::{Element, ElementType};

/// An element together with the activity fact the filter needs
#[derive(Debug, Clone, PartialEq)]
pub struct ElementCandidate {
    pub element: Element,
    /// At least one linked activity row has `completed = true`
    pub has_completed_activity: bool,
}

/// Element type gate: not on an initial version and not yet adjusted
pub fn element_type_is_eligible(element_type: &ElementType) -> bool {
    !element_type.is_initial_version() && !element_type.inv_adjust
}

/// Full eligibility rule for one produced element
///
/// Also requires a stamped `bom_revision_id`: without one there is no
/// as-produced revision to compare against.
pub fn is_eligible(element_type: &ElementType, candidate: &ElementCandidate) -> bool {
    let element = &candidate.element;
    element_type_is_eligible(element_type)
        && element.element_type_id == element_type.element_type_id
        && element.instage
        && !element.inv_adjust
        && candidate.has_completed_activity
        && element.bom_revision_id.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revised_type() -> ElementType {
        ElementType::new(7, 1, "Column C1").with_version("RV-2")
    }

    fn candidate() -> ElementCandidate {
        ElementCandidate {
            element: Element {
                id: 70,
                element_type_id: 7,
                project_id: 1,
                element_code: "C1-001".to_string(),
                bom_revision_id: Some(42),
                drawing_revision_id: None,
                instage: true,
                inv_adjust: false,
                updated_at: None,
            },
            has_completed_activity: true,
        }
    }

    #[test]
    fn test_happy_path_is_eligible() {
        assert!(is_eligible(&revised_type(), &candidate()));
    }

    #[test]
    fn test_initial_version_never_eligible() {
        for v in ["RV-1", "VR-1", "RV-01"] {
            let et = revised_type().with_version(v);
            assert!(!is_eligible(&et, &candidate()));
        }
    }

    #[test]
    fn test_each_element_gate() {
        let et = revised_type();

        let mut c = candidate();
        c.element.instage = false;
        assert!(!is_eligible(&et, &c));

        let mut c = candidate();
        c.element.inv_adjust = true;
        assert!(!is_eligible(&et, &c));

        let mut c = candidate();
        c.has_completed_activity = false;
        assert!(!is_eligible(&et, &c));

        let mut c = candidate();
        c.element.bom_revision_id = None;
        assert!(!is_eligible(&et, &c));
    }

    #[test]
    fn test_adjusted_type_hides_elements() {
        let mut et = revised_type();
        et.inv_adjust = true;
        assert!(!is_eligible(&et, &candidate()));
    }
}
