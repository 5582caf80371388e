/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::BlockPos;

/// Version written to and expected from the elevators file.
pub const FILE_VERSION: u32 = 1;

/***************************************/
/*       Public data structures        */
/***************************************/

/// Whole elevators file: one document per deployment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub version: u32,
    pub elevators: Vec<ElevatorSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorSnapshot {
    pub name: String,
    pub world: String,
    pub loc1: BlockPos,
    pub loc2: BlockPos,
    /// Car doors, relative to the master block.
    #[serde(default, alias = "doorLevers")]
    pub doors: Vec<BlockPos>,
    #[serde(default)]
    pub floors: Vec<FloorSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FloorSnapshot {
    pub floor: i32,
    pub loc: BlockPos,
    /// Landing doors, absolute.
    #[serde(default, alias = "doorLevers")]
    pub doors: Vec<BlockPos>,
    #[serde(rename = "callButton", default)]
    pub call_button: Option<BlockPos>,
}

/// Just enough of a document to check its version before trusting the rest.
#[derive(Deserialize)]
pub(crate) struct VersionHeader {
    pub version: u32,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            version: FILE_VERSION,
            elevators: Vec::new(),
        }
    }
}

impl Document {
    /// Replaces the named elevator, or appends it if it is new.
    pub fn upsert(&mut self, snapshot: ElevatorSnapshot) {
        match self.elevators.iter_mut().find(|e| e.name == snapshot.name) {
            Some(existing) => *existing = snapshot,
            None => self.elevators.push(snapshot),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.elevators.retain(|e| e.name != name);
    }

    /// Applies one `Store::save` call to the document.
    pub fn apply(&mut self, name: &str, snapshot: Option<&ElevatorSnapshot>) {
        match snapshot {
            Some(snapshot) => self.upsert(snapshot.clone()),
            None => self.remove(name),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ElevatorSnapshot> {
        self.elevators.iter().find(|e| e.name == name)
    }
}
