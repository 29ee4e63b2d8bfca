use std::sync::Arc;

use atlas_transit::{ErrorKind, PlaceCatalog, PlaceGeometry, PlaceLevel};

/// A place the user picked on the map or from the catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedPlace {
    pub name: Arc<str>,
    pub level: PlaceLevel,
}

impl SelectedPlace {
    pub fn new(name: impl Into<Arc<str>>, level: PlaceLevel) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// Which list the place browser is showing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationLevel {
    #[default]
    Department,
    /// Districts of the department in [`ParentInfo::department`]
    District,
}

/// Breadcrumb above the current selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentInfo {
    pub department: Arc<str>,
    pub municipality: Option<Arc<str>>,
}

/// Administrative-place selection and catalog
#[derive(Debug, Default)]
pub struct PlaceStore {
    catalog: Arc<PlaceCatalog>,
    selected: Option<SelectedPlace>,
    navigation: NavigationLevel,
    parent: Option<ParentInfo>,
    geometry: Option<PlaceGeometry>,
    geometry_loading: bool,
    error: Option<ErrorKind>,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &Arc<PlaceCatalog> {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: PlaceCatalog) {
        self.catalog = Arc::new(catalog);
    }

    pub fn selected(&self) -> Option<&SelectedPlace> {
        self.selected.as_ref()
    }

    pub fn navigation(&self) -> NavigationLevel {
        self.navigation
    }

    pub fn parent(&self) -> Option<&ParentInfo> {
        self.parent.as_ref()
    }

    pub fn geometry(&self) -> Option<&PlaceGeometry> {
        self.geometry.as_ref()
    }

    pub fn is_geometry_loading(&self) -> bool {
        self.geometry_loading
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Selects a place and positions the browser under it.
    ///
    /// A department drills down into its districts. A district or
    /// municipality keeps the browser on its department's districts, with the
    /// breadcrumb resolved from the catalog when the place is known.
    pub fn select(&mut self, place: SelectedPlace) {
        match place.level {
            PlaceLevel::Department => {
                self.parent = Some(ParentInfo {
                    department: place.name.clone(),
                    municipality: None,
                });
            }
            PlaceLevel::Municipality => {
                self.parent = self
                    .catalog
                    .municipalities
                    .iter()
                    .find(|m| m.name.eq_ignore_ascii_case(&place.name))
                    .map(|m| ParentInfo {
                        department: m.department.clone(),
                        municipality: None,
                    });
            }
            PlaceLevel::District => {
                self.parent = self.catalog.district(&place.name).map(|d| ParentInfo {
                    department: d.department.clone(),
                    municipality: Some(d.municipality.clone()),
                });
            }
        }

        self.navigation = if self.parent.is_some() {
            NavigationLevel::District
        } else {
            NavigationLevel::Department
        };
        self.selected = Some(place);
        self.geometry = None;
        self.geometry_loading = true;
        self.error = None;
    }

    /// Stores the outline of `place`; ignored if the selection moved on
    pub fn apply_geometry(
        &mut self,
        place: &SelectedPlace,
        geometry: Option<PlaceGeometry>,
        error: Option<ErrorKind>,
    ) -> bool {
        if self.selected.as_ref() != Some(place) {
            return false;
        }
        self.geometry = geometry;
        self.error = error;
        self.geometry_loading = false;
        true
    }

    /// Goes up one level. Returns the department to show next, if any.
    pub fn back(&mut self) -> Option<SelectedPlace> {
        let selected = self.selected.as_ref()?;

        let department = match (selected.level, &self.parent) {
            (PlaceLevel::Department, _) | (_, None) => None,
            (_, Some(parent)) => Some(parent.department.clone()),
        };

        match department {
            Some(department) => {
                let department = SelectedPlace::new(department, PlaceLevel::Department);
                self.select(department.clone());
                Some(department)
            }
            None => {
                self.clear();
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.navigation = NavigationLevel::Department;
        self.parent = None;
        self.geometry = None;
        self.geometry_loading = false;
        self.error = None;
    }
}
