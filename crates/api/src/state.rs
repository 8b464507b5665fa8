use std::sync::Arc;

use studygroup_domain::files::FileService;
use studygroup_domain::groups::{GroupService, GroupStores};
use studygroup_domain::invite::InviteCodec;
use studygroup_domain::messages::MessageService;
use studygroup_domain::polls::PollService;
use studygroup_domain::resources::ResourceService;
use studygroup_domain::tasks::TaskService;
use studygroup_infra::config::AppConfig;
use studygroup_infra::repositories::memory_group_stores;
use studygroup_infra::storage::LocalFileStore;

use crate::gateway::presence::PresenceRegistry;
use crate::gateway::rooms::RoomHub;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub groups: GroupService,
    pub messages: MessageService,
    pub resources: ResourceService,
    pub tasks: TaskService,
    pub polls: PollService,
    pub files: FileService,
    pub rooms: RoomHub,
    pub presence: Arc<PresenceRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let file_store = Arc::new(LocalFileStore::new(config.upload_dir.clone()));
        let stores = memory_group_stores(file_store);
        Self::with_stores(config, stores)
    }

    pub fn with_stores(config: AppConfig, stores: GroupStores) -> Self {
        let codec = InviteCodec::new(
            stores.groups.clone(),
            config.jwt_secret.clone(),
            config.invite_token_ttl_days,
            config.join_code_max_attempts,
        );
        let rooms = RoomHub::new(config.room_channel_capacity);
        Self {
            config: config.clone(),
            groups: GroupService::new(stores.clone(), codec),
            messages: MessageService::new(stores.groups.clone(), stores.messages.clone()),
            resources: ResourceService::new(stores.groups.clone(), stores.resources.clone()),
            tasks: TaskService::new(stores.groups.clone(), stores.tasks.clone()),
            polls: PollService::new(stores.groups.clone(), stores.polls.clone()),
            files: FileService::new(
                stores.groups.clone(),
                stores.files.clone(),
                stores.file_store.clone(),
                config.max_upload_bytes,
            ),
            rooms,
            presence: Arc::new(PresenceRegistry::default()),
        }
    }
}
