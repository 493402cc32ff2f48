use std::cell::RefCell;
use std::rc::Rc;

use kite_primitives::{MouseButtons, Point};
use kite_tool::{ContextMenu, EventMatcher, MenuItem, MenuTrigger, ToolEvent, ToolId, ToolRun, ToolStatus};
use pretty_assertions::assert_eq;

use crate::common::{A, B, Harness, Log, TestTool, harness};

struct Routing {
	h: Harness,
	log: Log,
	route: ToolId,
	other: ToolId,
	inner_run: Rc<RefCell<Option<ToolRun>>>,
}

/// "route" waits for a cancel in its outer run and nests an inner run that
/// waits for a click whenever "route.via" arrives. "other" idles on a message.
fn routing() -> Routing {
	let h = harness();
	let log = Log::default();
	let inner_run: Rc<RefCell<Option<ToolRun>>> = Rc::default();

	let l = log.clone();
	let slot = inner_run.clone();
	let route = h
		.manager
		.register_tool(TestTool::<A>::new("route").with_transitions(move |m, id| {
			let outer = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("route"), move |run, _| {
				let l = outer.clone();
				async move {
					match run.wait(EventMatcher::cancel()).await {
						Some(_) => l.push("outer cancel"),
						None => l.push("outer shutdown"),
					}
				}
			});
			let inner = l.clone();
			let slot = slot.clone();
			m.schedule_next_state(id, EventMatcher::action("route.via"), move |run, _| {
				let l = inner.clone();
				*slot.borrow_mut() = Some(run.clone());
				async move {
					l.push("inner start");
					match run.wait(EventMatcher::click(MouseButtons::LEFT)).await {
						Some(_) => l.push("inner click"),
						None => l.push("inner shutdown"),
					}
				}
			});
		}))
		.unwrap();

	let l = log.clone();
	let other = h
		.manager
		.register_tool(TestTool::<B>::new("other").with_transitions(move |m, id| {
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("other"), move |run, _| {
				let l = l.clone();
				async move {
					while run.wait(EventMatcher::message("never")).await.is_some() {}
					l.push("other shutdown");
				}
			});
		}))
		.unwrap();
	h.manager.init_tools();

	Routing {
		h,
		log,
		route,
		other,
		inner_run,
	}
}

#[test]
fn nested_run_carries_view_settings_and_restores_outer_frame() {
	let Routing { h, log, route, other, .. } = routing();

	assert!(h.manager.invoke_tool("route"));
	h.view.update(|settings| settings.snapping = true);

	assert!(h.manager.invoke_tool("other"));
	assert_eq!(h.manager.current_tool(), Some(other));
	assert!(!h.view.settings.borrow().snapping);

	assert!(h.manager.process_event(ToolEvent::action("route.via")));
	assert_eq!(h.manager.nested_depth(route), 1);
	assert_eq!(h.manager.tool_status(route), Some(ToolStatus::Waiting));
	assert_eq!(h.manager.active_tools(), vec![route, other]);
	assert_eq!(h.manager.current_tool(), Some(route));
	assert!(h.view.settings.borrow().snapping);

	assert!(h.manager.process_event(ToolEvent::click(MouseButtons::LEFT, Point::ORIGIN)));
	assert_eq!(h.manager.nested_depth(route), 0);
	assert_eq!(h.manager.tool_status(route), Some(ToolStatus::Waiting));
	assert_eq!(h.manager.initial_event(route), Some(ToolEvent::activate("route").with_position(Point::ORIGIN)));

	assert!(h.manager.process_event(ToolEvent::cancel()));
	assert_eq!(log.entries(), vec!["inner start", "inner click", "outer cancel"]);
	assert_eq!(h.manager.active_tools(), vec![other]);
	assert_eq!(h.manager.tool_status(route), Some(ToolStatus::Idle));
}

#[test]
fn finished_nested_run_handle_is_inert() {
	let Routing { h, route, inner_run, .. } = routing();

	h.manager.invoke_tool("route");
	h.manager.process_event(ToolEvent::action("route.via"));
	h.manager.process_event(ToolEvent::click(MouseButtons::LEFT, Point::ORIGIN));
	assert_eq!(h.manager.nested_depth(route), 0);

	let stale = inner_run.borrow_mut().take().unwrap();
	stale.schedule_context_menu(
		ContextMenu::new("stale").with_item(MenuItem::new(1, "Nope")),
		MenuTrigger::Now,
	);
	h.manager.process_event(ToolEvent::message("tick"));
	assert!(h.frame.popups.borrow().is_empty());
	assert_eq!(h.manager.tool_status(route), Some(ToolStatus::Waiting));
}
