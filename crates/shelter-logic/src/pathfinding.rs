//! Waypoint pathfinding over the shelter layout.
//!
//! `NavGraph` holds the same-floor adjacency list and the shaft groups of a
//! layout snapshot and answers route queries with BFS, caching same-floor
//! room chains in a bounded cache. Rebuild it whenever the layout changes.
//!
//! # Routes
//!
//! - Same floor: BFS over touching rooms, one waypoint at each wall the agent
//!   crosses after leaving its own room, then the requested point.
//! - Different floors: for every shaft group, BFS to a room opening onto the
//!   shaft, ride the shaft centre line to the destination floor, BFS from the
//!   exit room to the destination. The group giving the fewest waypoints wins.
//! - Same room: no waypoints.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::NavConfig;
use crate::geometry::{Rect, Vec2};
use crate::layout::{Layout, ShaftGroup, SpatialQuery};
use crate::room::RoomId;

/// Where an agent is, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// Room used as the route origin.
    pub room: RoomId,
    /// Set when the agent was too far outside every room and must be moved here.
    pub snap_to: Option<Vec2>,
    /// Index of the shaft group the agent is currently riding, if any.
    pub shaft: Option<usize>,
}

/// A complete route from an agent's live position.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub origin: RoomId,
    pub waypoints: Vec<Vec2>,
    pub snap_to: Option<Vec2>,
}

#[derive(Debug, Clone, Copy)]
struct NavRoom {
    rect: Rect,
    accessible: bool,
}

#[derive(Debug, Clone)]
struct ShaftLink {
    group: ShaftGroup,
    rooms: Vec<RoomId>,
}

/// Pre-built navigation graph with BFS routing and a room-chain cache.
pub struct NavGraph {
    cfg: NavConfig,
    rooms: HashMap<RoomId, NavRoom>,
    /// room → same-floor neighbours, in construction order.
    adj: HashMap<RoomId, Vec<RoomId>>,
    shafts: Vec<ShaftLink>,
    /// (from, to) → cached same-floor room chain.
    cache: HashMap<(RoomId, RoomId), Vec<RoomId>>,
}

impl NavGraph {
    pub fn build(layout: &Layout, cfg: &NavConfig) -> Self {
        let rooms: HashMap<RoomId, NavRoom> = layout
            .rooms()
            .iter()
            .map(|r| {
                (
                    r.id,
                    NavRoom {
                        rect: r.rect,
                        accessible: r.flags().accessible,
                    },
                )
            })
            .collect();

        let mut adj: HashMap<RoomId, Vec<RoomId>> = HashMap::new();
        let list = layout.rooms();
        for (i, a) in list.iter().enumerate() {
            for b in &list[i + 1..] {
                if Layout::rooms_adjacent(&a.rect, &b.rect, cfg) {
                    adj.entry(a.id).or_default().push(b.id);
                    adj.entry(b.id).or_default().push(a.id);
                }
            }
        }

        let shafts = layout
            .shaft_groups(cfg)
            .into_iter()
            .map(|group| {
                let rooms = list
                    .iter()
                    .filter(|r| group.is_adjacent(&r.rect, cfg.shaft_tolerance))
                    .map(|r| r.id)
                    .collect();
                ShaftLink { group, rooms }
            })
            .collect();

        Self {
            cfg: cfg.clone(),
            rooms,
            adj,
            shafts,
            cache: HashMap::new(),
        }
    }

    /// Same-floor neighbours of a room.
    pub fn neighbors(&self, room: RoomId) -> &[RoomId] {
        self.adj.get(&room).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn shaft_groups(&self) -> impl Iterator<Item = &ShaftGroup> {
        self.shafts.iter().map(|s| &s.group)
    }

    /// Rooms opening onto the given shaft group.
    pub fn shaft_rooms(&self, group: usize) -> &[RoomId] {
        self.shafts
            .get(group)
            .map(|s| s.rooms.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_room(&self, room: RoomId) -> bool {
        self.rooms.contains_key(&room)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    // ── Origin inference ───────────────────────────────────────────────

    /// Infer the route origin from a live position.
    ///
    /// Inside a room: that room. Inside a shaft: the room on the shaft nearest
    /// the agent's height. Elsewhere: the nearest room, with a snap point when
    /// the agent is further than `snap_distance` from its centre.
    pub fn locate(&self, layout: &Layout, pos: Vec2) -> Option<Located> {
        if let Some(room) = layout.room_at(pos) {
            return Some(Located {
                room,
                snap_to: None,
                shaft: None,
            });
        }

        if let Some(index) = self.shafts.iter().position(|s| s.group.contains(pos)) {
            let nearest = self.shafts[index]
                .rooms
                .iter()
                .filter_map(|id| {
                    let r = self.rooms.get(id)?;
                    Some((*id, (r.rect.walk_y() - pos.y).abs()))
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((room, _)) = nearest {
                return Some(Located {
                    room,
                    snap_to: None,
                    shaft: Some(index),
                });
            }
        }

        let (room, distance) = layout.nearest_room(pos)?;
        let snap_to = if distance > self.cfg.snap_distance {
            self.rooms.get(&room).map(|r| r.rect.center())
        } else {
            None
        };
        Some(Located {
            room,
            snap_to,
            shaft: None,
        })
    }

    /// Route from a live position to `target` inside `to`.
    ///
    /// Returns `None` when no route exists; callers keep whatever route the
    /// agent already had.
    pub fn route_from(
        &mut self,
        layout: &Layout,
        pos: Vec2,
        to: RoomId,
        target: Vec2,
    ) -> Option<Route> {
        let located = self.locate(layout, pos)?;
        let mut waypoints = self.find_route(located.room, to, target)?;

        if let Some(index) = located.shaft {
            if waypoints.is_empty() {
                waypoints.push(target);
            }
            // Finish the ride on the origin floor before walking anywhere.
            let floor_y = self.rooms.get(&located.room)?.rect.walk_y();
            waypoints.insert(0, Vec2::new(self.shafts[index].group.center_x(), floor_y));
        }
        dedup_waypoints(&mut waypoints);

        Some(Route {
            origin: located.room,
            waypoints,
            snap_to: located.snap_to,
        })
    }

    /// Waypoints from room `from` to `target` inside room `to`.
    pub fn find_route(&mut self, from: RoomId, to: RoomId, target: Vec2) -> Option<Vec<Vec2>> {
        if from == to {
            return Some(vec![]);
        }
        let from_rect = self.rooms.get(&from)?.rect;
        let to_rect = self.rooms.get(&to)?.rect;

        if Layout::same_floor(&from_rect, &to_rect, &self.cfg) {
            let chain = self.room_chain(from, to)?;
            let mut waypoints = self.crossings(&chain, from_rect.walk_y());
            waypoints.push(target);
            return Some(waypoints);
        }

        let mut best: Option<Vec<Vec2>> = None;
        for link in &self.shafts {
            let Some(route) = self.route_via_shaft(link, from, to, &from_rect, &to_rect, target)
            else {
                continue;
            };
            if best.as_ref().map_or(true, |b| route.len() < b.len()) {
                best = Some(route);
            }
        }
        best
    }

    /// Same-floor room chain `from ..= to` via BFS (cached).
    pub fn room_chain(&mut self, from: RoomId, to: RoomId) -> Option<Vec<RoomId>> {
        if from == to {
            return Some(vec![from]);
        }
        let key = (from, to);
        if let Some(cached) = self.cache.get(&key) {
            return Some(cached.clone());
        }

        let chain = self.bfs(from, |r| r == to)?;

        if self.cache.len() >= self.cfg.path_cache_capacity {
            // Evict an arbitrary entry
            if let Some(&evict_key) = self.cache.keys().next() {
                self.cache.remove(&evict_key);
            }
        }
        if self.cfg.path_cache_capacity > 0 {
            self.cache.insert(key, chain.clone());
        }
        Some(chain)
    }

    fn route_via_shaft(
        &self,
        link: &ShaftLink,
        from: RoomId,
        to: RoomId,
        from_rect: &Rect,
        to_rect: &Rect,
        target: Vec2,
    ) -> Option<Vec<Vec2>> {
        let entry = self.bfs(from, |r| link.rooms.contains(&r))?;
        let mut exit = self.bfs(to, |r| link.rooms.contains(&r))?;
        exit.reverse();

        let entry_rect = self.rooms.get(entry.last()?)?.rect;
        let exit_rect = self.rooms.get(exit.first()?)?.rect;
        // Both ends must be on the requested floors, not just on the shaft.
        if !Layout::same_floor(&entry_rect, from_rect, &self.cfg)
            || !Layout::same_floor(&exit_rect, to_rect, &self.cfg)
        {
            return None;
        }

        let shaft_x = link.group.center_x();
        let mut waypoints = self.crossings(&entry, from_rect.walk_y());
        waypoints.push(Vec2::new(shaft_x, from_rect.walk_y()));
        waypoints.push(Vec2::new(shaft_x, to_rect.walk_y()));
        waypoints.extend(self.crossings(&exit, to_rect.walk_y()));
        waypoints.push(target);
        Some(waypoints)
    }

    /// One waypoint per wall crossed after the first room of the chain; the
    /// first wall lies on the straight walk out of the starting room.
    fn crossings(&self, chain: &[RoomId], walk_y: f32) -> Vec<Vec2> {
        chain
            .windows(2)
            .skip(1)
            .filter_map(|pair| {
                let a = self.rooms.get(&pair[0])?;
                let b = self.rooms.get(&pair[1])?;
                Some(Vec2::new(Layout::boundary_x(&a.rect, &b.rect), walk_y))
            })
            .collect()
    }

    /// BFS from `from` to the first room satisfying `goal`. Inaccessible rooms
    /// are never passed through, though they may be the goal.
    fn bfs(&self, from: RoomId, goal: impl Fn(RoomId) -> bool) -> Option<Vec<RoomId>> {
        if goal(from) {
            return Some(vec![from]);
        }
        let mut visited = HashSet::new();
        let mut came_from: HashMap<RoomId, RoomId> = HashMap::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for &next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                came_from.insert(next, current);
                if goal(next) {
                    let mut chain = vec![next];
                    let mut node = next;
                    while let Some(&prev) = came_from.get(&node) {
                        chain.push(prev);
                        node = prev;
                    }
                    chain.reverse();
                    return Some(chain);
                }
                let passable = self.rooms.get(&next).map_or(false, |r| r.accessible);
                if passable {
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

fn dedup_waypoints(waypoints: &mut Vec<Vec2>) {
    waypoints.dedup_by(|b, a| a.distance_squared(b) < 0.01);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomKind;

    const H: f32 = 60.0;

    /// Entrance, Quarters, Dining, Bath in one touching row.
    fn row() -> Layout {
        let mut layout = Layout::new();
        layout.add_room(RoomKind::Entrance, "Entrance", Rect::new(0.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::Quarters, "Quarters", Rect::new(100.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::DiningHall, "Dining", Rect::new(200.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::Bathroom, "Bath", Rect::new(300.0, 0.0, 100.0, H));
        layout
    }

    /// Two floors joined by a shaft at x 400..440.
    ///
    /// ```text
    /// floor 0:  [0 Entrance][1 Quarters][2 Dining][shaft]
    /// floor 1:  [3 Lab     ][4 Workshop][5 Store ][shaft]
    /// ```
    fn two_floors() -> Layout {
        let mut layout = Layout::new();
        layout.add_room(RoomKind::Entrance, "Entrance", Rect::new(100.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::Quarters, "Quarters", Rect::new(200.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::DiningHall, "Dining", Rect::new(300.0, 0.0, 100.0, H));
        layout.add_room(RoomKind::Laboratory, "Lab", Rect::new(100.0, H, 100.0, H));
        layout.add_room(RoomKind::Workshop, "Workshop", Rect::new(200.0, H, 100.0, H));
        layout.add_room(RoomKind::Storage, "Store", Rect::new(300.0, H, 100.0, H));
        layout.add_shaft(Rect::new(400.0, 0.0, 40.0, H));
        layout.add_shaft(Rect::new(400.0, H, 40.0, H));
        layout
    }

    fn graph(layout: &Layout) -> NavGraph {
        NavGraph::build(layout, &NavConfig::default())
    }

    #[test]
    fn test_same_room() {
        let layout = row();
        let mut nav = graph(&layout);
        assert_eq!(nav.find_route(RoomId(1), RoomId(1), Vec2::new(150.0, 30.0)), Some(vec![]));
    }

    #[test]
    fn test_adjacent_rooms() {
        let layout = row();
        let mut nav = graph(&layout);
        let target = Vec2::new(150.0, 30.0);
        let route = nav.find_route(RoomId(0), RoomId(1), target).unwrap();
        assert_eq!(route, vec![target]);
    }

    #[test]
    fn test_entrance_to_bath_crosses_two_walls() {
        let layout = row();
        let mut nav = graph(&layout);
        let target = Vec2::new(350.0, 30.0);
        let route = nav.find_route(RoomId(0), RoomId(3), target).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route[0], Vec2::new(200.0, 30.0)); // Quarters | Dining
        assert_eq!(route[1], Vec2::new(300.0, 30.0)); // Dining | Bath
        assert_eq!(route[2], target);
        let bath = layout.room(RoomId(3)).unwrap();
        assert!(bath.rect.contains(*route.last().unwrap()));
    }

    #[test]
    fn test_reverse_direction() {
        let layout = row();
        let mut nav = graph(&layout);
        let target = Vec2::new(50.0, 30.0);
        let route = nav.find_route(RoomId(3), RoomId(0), target).unwrap();
        assert_eq!(route, vec![Vec2::new(200.0, 30.0), Vec2::new(100.0, 30.0), target]);
    }

    #[test]
    fn test_unreachable_same_floor() {
        let mut layout = row();
        let island = layout.add_room(RoomKind::Garden, "Island", Rect::new(900.0, 0.0, 100.0, H));
        let mut nav = graph(&layout);
        assert_eq!(nav.find_route(RoomId(0), island, Vec2::new(950.0, 30.0)), None);
    }

    #[test]
    fn test_no_shaft_between_floors() {
        let mut layout = row();
        let below = layout.add_room(RoomKind::Garden, "Below", Rect::new(0.0, H, 100.0, H));
        let mut nav = graph(&layout);
        assert_eq!(nav.find_route(RoomId(0), below, Vec2::new(50.0, 90.0)), None);
    }

    #[test]
    fn test_cross_floor_via_shaft() {
        let layout = two_floors();
        let mut nav = graph(&layout);
        let target = Vec2::new(150.0, 90.0);
        let route = nav.find_route(RoomId(0), RoomId(3), target).unwrap();

        // Walk east to the shaft, ride down, walk west to the Lab.
        let vertical: Vec<_> = route
            .windows(2)
            .filter(|w| w[0].x == w[1].x && w[0].y != w[1].y)
            .collect();
        assert_eq!(vertical.len(), 1);
        assert_eq!(vertical[0][0].x, 420.0);
        assert_eq!(vertical[0][0].y, 30.0);
        assert_eq!(vertical[0][1].y, 90.0);
        assert_eq!(*route.last().unwrap(), target);
        assert!(layout.room(RoomId(3)).unwrap().rect.contains(target));
    }

    #[test]
    fn test_picks_shaft_with_fewest_waypoints() {
        let mut layout = two_floors();
        // A second shaft on the west side, next to Entrance and Lab.
        layout.add_shaft(Rect::new(60.0, 0.0, 40.0, H));
        layout.add_shaft(Rect::new(60.0, H, 40.0, H));
        let mut nav = graph(&layout);

        let route = nav.find_route(RoomId(0), RoomId(3), Vec2::new(150.0, 90.0)).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route[0], Vec2::new(80.0, 30.0));
        assert_eq!(route[1], Vec2::new(80.0, 90.0));
    }

    #[test]
    fn test_inaccessible_room_blocks_passage() {
        let mut layout = row();
        layout.update_room(RoomId(2), |f| f.accessible = false).unwrap();
        let mut nav = graph(&layout);
        assert_eq!(nav.find_route(RoomId(0), RoomId(3), Vec2::new(350.0, 30.0)), None);
        // Still reachable as a destination.
        assert!(nav.find_route(RoomId(0), RoomId(2), Vec2::new(250.0, 30.0)).is_some());
    }

    #[test]
    fn test_chain_cache_hit() {
        let layout = row();
        let mut nav = graph(&layout);
        let first = nav.room_chain(RoomId(0), RoomId(3)).unwrap();
        assert_eq!(nav.cache_size(), 1);
        let second = nav.room_chain(RoomId(0), RoomId(3)).unwrap();
        assert_eq!(first, second);
        assert_eq!(nav.cache_size(), 1);
    }

    #[test]
    fn test_chain_cache_eviction() {
        let layout = row();
        let cfg = NavConfig {
            path_cache_capacity: 2,
            ..NavConfig::default()
        };
        let mut nav = NavGraph::build(&layout, &cfg);
        nav.room_chain(RoomId(0), RoomId(1));
        nav.room_chain(RoomId(0), RoomId(2));
        assert_eq!(nav.cache_size(), 2);
        nav.room_chain(RoomId(0), RoomId(3));
        assert_eq!(nav.cache_size(), 2);
    }

    #[test]
    fn test_locate_inside_room() {
        let layout = row();
        let nav = graph(&layout);
        let loc = nav.locate(&layout, Vec2::new(250.0, 30.0)).unwrap();
        assert_eq!(loc.room, RoomId(2));
        assert_eq!(loc.snap_to, None);
    }

    #[test]
    fn test_locate_slightly_outside_uses_nearest_without_snap() {
        let layout = row();
        let nav = graph(&layout);
        let loc = nav.locate(&layout, Vec2::new(250.0, 70.0)).unwrap();
        assert_eq!(loc.room, RoomId(2));
        assert_eq!(loc.snap_to, None);
    }

    #[test]
    fn test_locate_far_outside_snaps() {
        let layout = row();
        let nav = graph(&layout);
        let loc = nav.locate(&layout, Vec2::new(250.0, 400.0)).unwrap();
        assert_eq!(loc.room, RoomId(2));
        assert_eq!(loc.snap_to, Some(Vec2::new(250.0, 30.0)));
    }

    #[test]
    fn test_route_from_inside_shaft_aligns_first() {
        let layout = two_floors();
        let mut nav = graph(&layout);
        // Halfway down the shaft, closer to the lower floor.
        let pos = Vec2::new(420.0, 80.0);
        let route = nav
            .route_from(&layout, pos, RoomId(3), Vec2::new(150.0, 90.0))
            .unwrap();
        assert_eq!(route.origin, RoomId(5));
        assert_eq!(route.waypoints[0], Vec2::new(420.0, 90.0));
        assert!(route.waypoints[1].y == 90.0);
    }

    #[test]
    fn test_route_from_shaft_into_adjacent_room() {
        let layout = two_floors();
        let mut nav = graph(&layout);
        let target = Vec2::new(350.0, 30.0);
        let route = nav
            .route_from(&layout, Vec2::new(420.0, 10.0), RoomId(2), target)
            .unwrap();
        assert_eq!(route.origin, RoomId(2));
        assert_eq!(route.waypoints, vec![Vec2::new(420.0, 30.0), target]);
    }

    #[test]
    fn test_route_from_same_room_is_empty() {
        let layout = row();
        let mut nav = graph(&layout);
        let route = nav
            .route_from(&layout, Vec2::new(120.0, 30.0), RoomId(1), Vec2::new(180.0, 30.0))
            .unwrap();
        assert!(route.waypoints.is_empty());
    }
}
