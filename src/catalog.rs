use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{AcademicLevel, ResourceKind};

/// A bookable physical asset. Seeded at startup, immutable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,
    /// Seats or headcount for rooms; 0 for equipment.
    pub capacity: u32,
    /// Grade affinity, classrooms only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_level: Option<AcademicLevel>,
}

/// Registry of bookable resources. Read-only after construction, so it is
/// shared behind a plain `Arc` with no locking.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceCatalog {
    pub fn new(resources: Vec<Resource>) -> Self {
        let index = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { resources, index }
    }

    /// The standard school enumeration: classrooms per level × section, the
    /// named facilities, fields and labs, plus loanable equipment.
    pub fn seed() -> Self {
        let mut resources = Vec::new();

        for level in [AcademicLevel::X, AcademicLevel::XI, AcademicLevel::XII] {
            for section in ["A", "B", "C", "D", "E", "F", "G", "H", "I"] {
                resources.push(Resource {
                    id: format!("room-{}-{}", level.as_label(), section),
                    name: format!("Kelas {}-{}", level.as_label(), section),
                    kind: ResourceKind::Classroom,
                    capacity: 36,
                    academic_level: Some(level),
                });
            }
        }

        let named: [(&str, &str, ResourceKind, u32); 20] = [
            ("av", "Ruangan Audio Visual", ResourceKind::Hall, 50),
            ("rsg", "Ruangan Serba Guna", ResourceKind::Hall, 200),
            ("l-utama", "Lapangan Utama", ResourceKind::Field, 500),
            ("l-basket", "Lapangan Basket", ResourceKind::Field, 50),
            ("l-futsal", "Lapangan Futsal", ResourceKind::Field, 50),
            ("pendopo", "Pendopo", ResourceKind::Hall, 100),
            ("l-badminton", "Lapangan Badminton", ResourceKind::Field, 20),
            ("perpus", "Perpustakaan", ResourceKind::Library, 80),
            ("r-musik", "Ruang Musik", ResourceKind::Hall, 20),
            ("m-l1", "Masjid Lantai Satu", ResourceKind::ReligiousSpace, 300),
            ("m-l2", "Masjid Lantai Dua", ResourceKind::ReligiousSpace, 200),
            ("lr-l1", "Lorong Lantai Satu", ResourceKind::CommonArea, 30),
            ("lr-l2", "Lorong Lantai Dua", ResourceKind::CommonArea, 30),
            ("lr-l3", "Lorong Lantai Tiga", ResourceKind::CommonArea, 30),
            ("lab-kimia", "Lab Kimia", ResourceKind::Laboratory, 40),
            ("lab-fisika", "Lab Fisika", ResourceKind::Laboratory, 40),
            ("lab-biologi", "Lab Biologi", ResourceKind::Laboratory, 40),
            ("lab-komp1", "Lab Komputer Satu", ResourceKind::Laboratory, 40),
            ("lab-komp2", "Lab Komputer Dua", ResourceKind::Laboratory, 40),
            ("lab-komp3", "Lab Komputer Tiga", ResourceKind::Laboratory, 40),
        ];
        for (id, name, kind, capacity) in named {
            resources.push(Resource {
                id: id.into(),
                name: name.into(),
                kind,
                capacity,
                academic_level: None,
            });
        }

        let equipment = [
            ("eq-1", "Proyektor Epson EB-X05"),
            ("eq-2", "Sound System Portable"),
            ("eq-3", "Kabel Roll 20m"),
            ("eq-4", "Pointer Presentasi"),
            ("eq-5", "Microphone Wireless"),
            ("eq-6", "Layar Proyektor (Screen)"),
        ];
        for (id, name) in equipment {
            resources.push(Resource {
                id: id.into(),
                name: name.into(),
                kind: ResourceKind::Equipment,
                capacity: 0,
                academic_level: None,
            });
        }

        Self::new(resources)
    }

    /// Load a catalog from a JSON array of resources.
    pub fn from_json_file(path: &Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        let resources: Vec<Resource> = serde_json::from_slice(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(resources))
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    /// Resources of one kind, in seed order. Feeds the booking form's
    /// per-category choices.
    pub fn list_by_kind(&self, kind: ResourceKind) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
