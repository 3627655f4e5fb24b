//! In-memory [`VendingApi`] for engine tests.
//!
//! Every call answers from what was scripted beforehand. Anything not
//! scripted fails with a connection error, the way an unreachable platform
//! would.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::client::VendingApi;
use crate::error::{SyncError, SyncResult};
use washwise_core::{MachineDetail, MachineListItem, MachineType};

#[derive(Default)]
pub(crate) struct ScriptedApi {
    types: Mutex<HashMap<String, Vec<MachineType>>>,
    machines: Mutex<HashMap<(String, String), Vec<MachineListItem>>>,
    details: Mutex<HashMap<i64, MachineDetail>>,
    page_sizes: Mutex<Vec<u32>>,
}

impl ScriptedApi {
    pub(crate) fn set_types(&self, shop_id: &str, types: Vec<MachineType>) {
        self.types.lock().unwrap().insert(shop_id.to_string(), types);
    }

    pub(crate) fn fail_types(&self, shop_id: &str) {
        self.types.lock().unwrap().remove(shop_id);
    }

    pub(crate) fn set_machines(&self, shop_id: &str, type_id: &str, items: &[(&str, &str)]) {
        let items = items
            .iter()
            .map(|(id, name)| MachineListItem {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self.machines
            .lock()
            .unwrap()
            .insert((shop_id.to_string(), type_id.to_string()), items);
    }

    pub(crate) fn set_detail(&self, machine_id: i64, detail: MachineDetail) {
        self.details.lock().unwrap().insert(machine_id, detail);
    }

    /// Page sizes requested so far, in call order.
    pub(crate) fn page_sizes(&self) -> Vec<u32> {
        self.page_sizes.lock().unwrap().clone()
    }
}

fn unscripted(what: String) -> SyncError {
    SyncError::ConnectionFailed(format!("nothing scripted for {what}"))
}

#[async_trait]
impl VendingApi for ScriptedApi {
    async fn fetch_types(&self, shop_id: &str) -> SyncResult<Vec<MachineType>> {
        self.types
            .lock()
            .unwrap()
            .get(shop_id)
            .cloned()
            .ok_or_else(|| unscripted(format!("types of {shop_id}")))
    }

    async fn fetch_machines(
        &self,
        shop_id: &str,
        machine_type_id: &str,
        page_size: u32,
        _page: u32,
    ) -> SyncResult<Vec<MachineListItem>> {
        self.page_sizes.lock().unwrap().push(page_size);
        self.machines
            .lock()
            .unwrap()
            .get(&(shop_id.to_string(), machine_type_id.to_string()))
            .cloned()
            .ok_or_else(|| unscripted(format!("machines of {shop_id}/{machine_type_id}")))
    }

    async fn fetch_detail(&self, machine_id: i64) -> SyncResult<MachineDetail> {
        self.details
            .lock()
            .unwrap()
            .get(&machine_id)
            .cloned()
            .ok_or_else(|| unscripted(format!("detail of {machine_id}")))
    }
}
