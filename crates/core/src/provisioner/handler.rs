//! Incident-org and collaboration room provisioning.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::ProvisionerConfig;
use crate::emapi::{CollabRoom, EmApi, NewIncidentOrg, Organization, SessionUser};
use crate::metrics;
use crate::orgs::OrgCache;

use super::{
    IncidentIds, IncidentNotification, ProcessOutcome, ProcessReport, ProvisionerError,
    RoomBatch, RoomTemplate, RoomsConfig, RouteKind, Router,
};

/// An organization to build rooms for, with the child org for joint rooms.
type RoomTarget = (Organization, Option<Organization>);

/// Reacts to incident notifications by associating organizations with
/// incidents and creating their collaboration rooms on em-api.
pub struct IncidentOrgProvisioner {
    api: Arc<dyn EmApi>,
    orgs: Arc<OrgCache>,
    router: Router,
    rooms: RoomsConfig,
    /// Userorg of the identity user; rooms are created as this user.
    identity_userorg_id: i64,
    create_rooms_regardless_of_registration: bool,
}

impl IncidentOrgProvisioner {
    pub fn new(
        api: Arc<dyn EmApi>,
        orgs: Arc<OrgCache>,
        router: Router,
        rooms: RoomsConfig,
        identity_userorg_id: i64,
        create_rooms_regardless_of_registration: bool,
    ) -> Self {
        Self {
            api,
            orgs,
            router,
            rooms,
            identity_userorg_id,
            create_rooms_regardless_of_registration,
        }
    }

    /// Resolve the identity user, parse the rooms configuration and fill the
    /// organization cache. Any failure here should stop the process.
    pub async fn bootstrap(
        config: &ProvisionerConfig,
        api: Arc<dyn EmApi>,
        orgs: Arc<OrgCache>,
    ) -> Result<Self, ProvisionerError> {
        let workspace_id = config.bootstrap_workspace_id;
        let identity_user = &config.emapi.identity_user;
        let identity_org_id = config.emapi.identity_org_id;

        let user_orgs = api.get_user_orgs(workspace_id, identity_user).await?;
        let identity_userorg_id = user_orgs
            .iter()
            .find(|uo| uo.orgid == identity_org_id)
            .map(|uo| uo.userorgid)
            .ok_or_else(|| ProvisionerError::IdentityNotFound {
                user: identity_user.clone(),
                org_id: identity_org_id,
            })?;

        let session = api
            .get_user_with_session(workspace_id, identity_userorg_id)
            .await
            .map_err(|e| ProvisionerError::IdentitySession(e.to_string()))?;
        if session.usersession_id <= 0 {
            return Err(ProvisionerError::IdentitySession(format!(
                "invalid usersessionid {}",
                session.usersession_id
            )));
        }
        info!(
            user = %identity_user,
            userorg_id = identity_userorg_id,
            "Resolved identity user"
        );

        let rooms = RoomsConfig::parse(&config.rooms)
            .map_err(|e| ProvisionerError::InvalidRoomsConfig(e.to_string()))?;
        debug!(rooms = rooms.rooms.len(), template = %rooms.template, "Parsed rooms configuration");

        let router = Router::new(&config.routing)?;

        orgs.populate(api.as_ref(), workspace_id).await?;

        Ok(Self::new(
            api,
            orgs,
            router,
            rooms,
            identity_userorg_id,
            config.create_rooms_regardless_of_registration,
        ))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn identity_userorg_id(&self) -> i64 {
        self.identity_userorg_id
    }

    /// Process one notification. Errors are logged and reported in the
    /// outcome, never returned.
    pub async fn process(&self, routing_key: &str, body: &str) -> ProcessReport {
        let route = self.router.classify(routing_key);
        metrics::NOTIFICATIONS_TOTAL
            .with_label_values(&[route.as_str()])
            .inc();

        if route == RouteKind::Unsupported {
            warn!(routing_key = routing_key, "Unsupported routing key");
            return ProcessReport {
                route,
                outcome: ProcessOutcome::Unsupported,
            };
        }

        debug!(routing_key = routing_key, route = route.as_str(), "Processing notification");

        let outcome = match self.dispatch(route, body).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(route = route.as_str(), error = %e, "Failed to process notification");
                metrics::NOTIFICATION_FAILURES
                    .with_label_values(&[route.as_str()])
                    .inc();
                ProcessOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(route = route.as_str(), outcome = ?outcome, "Notification processed");
        ProcessReport { route, outcome }
    }

    async fn dispatch(
        &self,
        route: RouteKind,
        body: &str,
    ) -> Result<ProcessOutcome, ProvisionerError> {
        let notification = IncidentNotification::parse(body)?;
        let ids = notification.ids()?;
        debug!(
            incident_id = ids.incident_id,
            incident_name = notification.incidentname.as_deref().unwrap_or("-"),
            "Parsed notification"
        );
        match route {
            RouteKind::IncidentAdded => self.handle_incident_added(ids).await,
            RouteKind::IncidentUpdated | RouteKind::IncidentOrgAdded => {
                self.handle_incorgs_added(ids).await
            }
            RouteKind::Escalation => self.handle_escalation(ids).await,
            RouteKind::Unsupported => Ok(ProcessOutcome::Unsupported),
        }
    }

    /// Associate the organizations registered for the incident type(s) with
    /// the incident. No rooms are created here.
    pub async fn handle_incident_added(
        &self,
        ids: IncidentIds,
    ) -> Result<ProcessOutcome, ProvisionerError> {
        let registered = self
            .api
            .get_orgs_registered_for_incident(ids.workspace_id, ids.incident_id)
            .await?;
        if registered.is_empty() {
            debug!(incident_id = ids.incident_id, "No registered orgs to add");
            return Ok(ProcessOutcome::NoRegisteredOrgs);
        }

        let user = self
            .api
            .get_user_by_session(ids.workspace_id, ids.usersession_id)
            .await?;

        let new_orgs: Vec<NewIncidentOrg> = registered
            .iter()
            .map(|org| NewIncidentOrg::new(org.org_id, ids.incident_id, user.user_id))
            .collect();

        let added = match self
            .api
            .add_incident_orgs(ids.workspace_id, ids.incident_id, &new_orgs)
            .await
        {
            Ok(count) => {
                metrics::INCIDENT_ORG_POSTS
                    .with_label_values(&["success"])
                    .inc();
                count
            }
            Err(e) => {
                metrics::INCIDENT_ORG_POSTS
                    .with_label_values(&["failed"])
                    .inc();
                return Err(e.into());
            }
        };

        // Orgs already on the incident are not counted, so added may be lower
        info!(
            incident_id = ids.incident_id,
            requested = new_orgs.len(),
            added = added,
            "Added incident orgs"
        );
        Ok(ProcessOutcome::IncidentOrgsAdded {
            requested: new_orgs.len(),
            added,
        })
    }

    /// Create the configured rooms for every registered organization, and
    /// optionally for every organization already on the incident.
    pub async fn handle_incorgs_added(
        &self,
        ids: IncidentIds,
    ) -> Result<ProcessOutcome, ProvisionerError> {
        let mut orgs = match self
            .api
            .get_orgs_registered_for_incident(ids.workspace_id, ids.incident_id)
            .await
        {
            Ok(orgs) => orgs,
            Err(e) => {
                warn!(
                    incident_id = ids.incident_id,
                    error = %e,
                    "Failed to fetch registered orgs, continuing without them"
                );
                Vec::new()
            }
        };

        if self.create_rooms_regardless_of_registration {
            self.merge_incident_orgs(ids, &mut orgs).await;
        }

        let targets: Vec<RoomTarget> = orgs.into_iter().map(|org| (org, None)).collect();
        self.create_rooms(ids, targets).await
    }

    /// Append every organization associated with the incident that is not
    /// already in `orgs`. Unresolvable associations are skipped.
    async fn merge_incident_orgs(&self, ids: IncidentIds, orgs: &mut Vec<Organization>) {
        let incident_orgs = match self
            .api
            .get_incident_orgs(ids.workspace_id, ids.incident_id)
            .await
        {
            Ok(incident_orgs) => incident_orgs,
            Err(e) => {
                warn!(incident_id = ids.incident_id, error = %e, "Failed to fetch incident orgs");
                return;
            }
        };

        let mut seen: HashSet<i64> = orgs.iter().map(|o| o.org_id).collect();
        for incident_org in incident_orgs {
            if seen.contains(&incident_org.orgid) {
                continue;
            }
            if let Some(org) = self
                .orgs
                .resolve(self.api.as_ref(), ids.workspace_id, incident_org.orgid)
                .await
            {
                seen.insert(org.org_id);
                orgs.push(org);
            }
        }
    }

    /// Create joint rooms for each (parent, child) pair among the
    /// organizations already on the incident.
    pub async fn handle_escalation(
        &self,
        ids: IncidentIds,
    ) -> Result<ProcessOutcome, ProvisionerError> {
        let incident_orgs = self
            .api
            .get_incident_orgs(ids.workspace_id, ids.incident_id)
            .await?;
        if incident_orgs.is_empty() {
            info!(incident_id = ids.incident_id, "No incident orgs to escalate from");
            return Ok(ProcessOutcome::NoParentOrgs);
        }

        let mut seen_children = HashSet::new();
        let mut targets: Vec<RoomTarget> = Vec::new();
        for incident_org in &incident_orgs {
            if !seen_children.insert(incident_org.orgid) {
                continue;
            }
            let Some(child) = self
                .orgs
                .resolve(self.api.as_ref(), ids.workspace_id, incident_org.orgid)
                .await
            else {
                continue;
            };
            let Some(parent_id) = child.parent_id() else {
                continue;
            };
            match self
                .orgs
                .resolve(self.api.as_ref(), ids.workspace_id, parent_id)
                .await
            {
                Some(parent) => {
                    debug!(child = child.org_id, parent = parent.org_id, "Found parent org");
                    targets.push((parent, Some(child)));
                }
                None => warn!(
                    child = child.org_id,
                    parent = parent_id,
                    "Parent org not found, skipping"
                ),
            }
        }

        if targets.is_empty() {
            debug!(incident_id = ids.incident_id, "No incident orgs have a parent");
            return Ok(ProcessOutcome::NoParentOrgs);
        }

        self.create_rooms(ids, targets).await
    }

    /// Build one room per (target, template) and post them as one batch.
    async fn create_rooms(
        &self,
        ids: IncidentIds,
        targets: Vec<RoomTarget>,
    ) -> Result<ProcessOutcome, ProvisionerError> {
        if targets.is_empty() || self.rooms.rooms.is_empty() {
            metrics::ROOM_BATCHES.with_label_values(&["empty"]).inc();
            return Ok(ProcessOutcome::NoRoomsToCreate);
        }

        let batch = self.build_batch(ids, &targets).await?;
        if batch.is_empty() {
            metrics::ROOM_BATCHES.with_label_values(&["empty"]).inc();
            return Ok(ProcessOutcome::NoRoomsToCreate);
        }

        match self
            .api
            .post_rooms_batch(
                ids.workspace_id,
                ids.incident_id,
                self.identity_userorg_id,
                batch.rooms(),
            )
            .await
        {
            Ok(()) => {
                metrics::ROOM_BATCHES.with_label_values(&["success"]).inc();
                info!(
                    incident_id = ids.incident_id,
                    rooms = batch.len(),
                    "Posted room batch"
                );
                Ok(ProcessOutcome::RoomsSubmitted { rooms: batch.len() })
            }
            Err(e) => {
                metrics::ROOM_BATCHES.with_label_values(&["failed"]).inc();
                Err(e.into())
            }
        }
    }

    async fn build_batch(
        &self,
        ids: IncidentIds,
        targets: &[RoomTarget],
    ) -> Result<RoomBatch, ProvisionerError> {
        let identity = self
            .api
            .get_user_with_session(ids.workspace_id, self.identity_userorg_id)
            .await
            .map_err(|e| ProvisionerError::IdentitySession(e.to_string()))?;
        if identity.usersession_id <= 0 {
            return Err(ProvisionerError::IdentitySession(format!(
                "invalid usersessionid {}",
                identity.usersession_id
            )));
        }

        let mut batch = RoomBatch::new();
        for (org, child) in targets {
            for template in &self.rooms.rooms {
                let key = RoomBatch::dedup_key(&template.room_name, org);
                if batch.contains(&key) {
                    debug!(room = %key.0, org = %key.1, "Room already in batch, skipping");
                    metrics::ROOMS_SKIPPED.inc();
                    continue;
                }

                match self
                    .build_room(ids, &identity, org, child.as_ref(), template)
                    .await
                {
                    Ok(room) => {
                        debug!(name = %room.name, secure = room.is_secure(), "Built room");
                        metrics::ROOMS_BUILT.inc();
                        batch.push(key, room);
                    }
                    Err(e) => warn!(
                        org_id = org.org_id,
                        room = %template.room_name,
                        error = %e,
                        "Failed to build room, continuing"
                    ),
                }
            }
        }

        Ok(batch)
    }

    async fn build_room(
        &self,
        ids: IncidentIds,
        identity: &SessionUser,
        org: &Organization,
        child: Option<&Organization>,
        template: &RoomTemplate,
    ) -> Result<CollabRoom, ProvisionerError> {
        for o in std::iter::once(org).chain(child) {
            if o.name.is_empty() {
                return Err(ProvisionerError::InvalidOrganization {
                    org_id: o.org_id,
                    reason: "missing name".to_string(),
                });
            }
        }

        let mut room = CollabRoom {
            incidentid: ids.incident_id,
            usersessionid: identity.usersession_id,
            name: self.rooms.full_room_name(&template.room_name, org, child),
            admin_users: None,
            read_write_users: None,
        };

        if template.is_secure {
            room.admin_users = Some(vec![identity.user_id]);
            match self
                .api
                .get_enabled_user_ids(ids.workspace_id, org.org_id)
                .await
            {
                Ok(user_ids) if !user_ids.is_empty() => room.read_write_users = Some(user_ids),
                Ok(_) => debug!(org_id = org.org_id, "No enabled users in org"),
                Err(e) => warn!(
                    org_id = org.org_id,
                    error = %e,
                    "Failed to fetch org users, creating secure room with admin only"
                ),
            }
        }

        Ok(room)
    }
}
