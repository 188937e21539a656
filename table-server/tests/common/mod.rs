//! 集成测试公共工具
//!
//! 内存数据库 + 种子数据: 门店 place-1 (biz-1) 三张桌台, 其中 t3 停用;
//! 门店 place-2 一张桌台。

#![allow(dead_code)]

use shared::models::{DiningTable, MenuItem, Place, SessionPayload, TableStatus};
use table_server::auth::StaffRole;
use table_server::db::seed::{SeedData, apply_seed};
use table_server::{Caller, Config, ServerState};

pub const SALT_T1: &str = "salt-t1";
pub const SALT_T2: &str = "salt-t2";
pub const SALT_T3: &str = "salt-t3";
pub const SALT_OTHER: &str = "salt-other";

pub struct TestEnv {
    pub state: ServerState,
    _dir: tempfile::TempDir,
}

fn place(id: &str, business_id: &str) -> Place {
    Place {
        id: id.into(),
        business_id: business_id.into(),
        name: format!("Place {id}"),
    }
}

fn table(id: &str, place_id: &str, salt: &str, disabled: bool) -> DiningTable {
    DiningTable {
        id: id.into(),
        place_id: place_id.into(),
        name: id.to_uppercase(),
        seats: 4,
        salt: salt.into(),
        status: TableStatus::Empty,
        disabled,
        current_group_id: None,
        deleted_at: None,
    }
}

fn menu_item(id: &str, name: &str, price: f64) -> MenuItem {
    MenuItem {
        id: id.into(),
        place_id: "place-1".into(),
        name: name.into(),
        price,
        discount_percent: 0.0,
        available: true,
    }
}

pub fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::for_tests(dir.path().to_string_lossy().to_string());
    let state = ServerState::in_memory(config).expect("state");

    let seed = SeedData {
        places: vec![place("place-1", "biz-1"), place("place-2", "biz-2")],
        menu_items: vec![
            menu_item("soup", "Soup", 5.0),
            menu_item("bread", "Bread", 2.5),
        ],
        tables: vec![
            table("t1", "place-1", SALT_T1, false),
            table("t2", "place-1", SALT_T2, false),
            table("t3", "place-1", SALT_T3, true),
            table("t9", "place-2", SALT_OTHER, false),
        ],
    };
    apply_seed(&state.storage, &seed).expect("seed");

    TestEnv { state, _dir: dir }
}

impl TestEnv {
    pub fn staff_token(&self, role: StaffRole, place_id: &str, business_id: &str) -> String {
        self.state
            .jwt_service
            .issue_staff_token("staff-1", role, place_id, business_id)
            .expect("staff token")
    }

    /// Caller as the auth extractor would build it
    pub fn caller(&self, token: &str) -> Caller {
        let claims = self.state.jwt_service.verify(token).expect("verify");
        Caller::from_claims(claims, token).expect("caller")
    }

    pub fn waiter(&self) -> Caller {
        self.caller(&self.staff_token(StaffRole::Waiter, "place-1", "biz-1"))
    }

    pub fn guest(&self, session: &SessionPayload) -> Caller {
        self.caller(&session.token)
    }

    pub fn table(&self, id: &str) -> DiningTable {
        self.state
            .storage
            .get_table(id)
            .expect("read table")
            .expect("table exists")
    }
}
