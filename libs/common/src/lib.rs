pub mod interfaces {
    pub mod arm;
    pub mod commit_store_v1_0_0;
    pub mod commit_store_v1_2_0;
    pub mod erc20;
    pub mod multicall;
    pub mod offramp_v1_0_0;
    pub mod offramp_v1_2_0;
    pub mod onramp_v1_0_0;
    pub mod onramp_v1_1_0;
    pub mod onramp_v1_2_0;
    pub mod price_registry_v1_0_0;
    pub mod price_registry_v1_2_0;
    pub mod token_pool;
    pub mod type_and_version;
}

pub mod event_cache;
