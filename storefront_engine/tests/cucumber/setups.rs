use cucumber::given;

use crate::{cucumber::StoreWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut StoreWorld) {
    world.system = Some(TestSystem::new().await);
}
