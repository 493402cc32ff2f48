use kite_primitives::{MouseButtons, Point};
use kite_tool::{ContextMenu, EventMatcher, MenuItem, MenuTrigger, ToolEvent, ToolId, ToolManager};
use pretty_assertions::assert_eq;

use crate::common::{A, B, Harness, Log, TestTool, describe, harness};

fn menu() -> ContextMenu {
	ContextMenu::new("Pick")
		.with_item(MenuItem::new(1, "Flip").with_action("edit.flip"))
		.with_item(MenuItem::new(2, "Rotate"))
}

/// Registers "pick", which schedules [`menu`] with `trigger` when activated
/// and logs what it receives until the menu closes. While its menu is open
/// the tool receives every event.
fn pick(h: &Harness, log: &Log, trigger: MenuTrigger) -> ToolId {
	let l = log.clone();
	h.manager
		.register_tool(TestTool::<A>::new("pick").with_transitions(move |m, id| {
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("pick"), move |run, _| {
				let l = l.clone();
				async move {
					run.schedule_context_menu(menu(), trigger);
					let predicate = EventMatcher::menu_choice() | EventMatcher::menu_closed() | EventMatcher::cancel();
					while let Some(event) = run.wait(predicate.clone()).await {
						let title = event.param_as::<ContextMenu>().map(|menu| menu.title.clone());
						if event.is_menu_choice() {
							l.push(format!(
								"pick choice {:?} {:?} {:?}",
								event.command_id(),
								event.command_name(),
								title
							));
							assert_eq!(event.position(), None);
						} else if event.is_menu_closed() {
							l.push("pick closed");
							break;
						} else if event.is_cancel() {
							break;
						} else {
							l.push(format!("pick {}", describe(&event)));
						}
					}
				}
			});
		}))
		.unwrap()
}

/// Registers "spy", which logs every menu event and ping message it sees and
/// passes events on.
fn spy(h: &Harness, log: &Log) -> ToolId {
	let l = log.clone();
	h.manager
		.register_tool(TestTool::<B>::new("spy").with_transitions(move |m: &ToolManager, id| {
			let waiting = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("spy"), move |run, _| {
				let l = waiting.clone();
				async move {
					while let Some(event) = run.wait(EventMatcher::menu_choice() | EventMatcher::menu_closed()).await {
						l.push(if event.is_menu_closed() { "spy closed" } else { "spy choice" });
						event.pass_event();
					}
				}
			});
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::message("ping"), move |_, _| {
				let l = l.clone();
				async move { l.push("ping") }
			});
		}))
		.unwrap()
}

fn right_click() -> ToolEvent {
	ToolEvent::click(MouseButtons::RIGHT, Point::new(1.0, 1.0))
}

#[test]
fn chosen_item_is_delivered_before_close() {
	let h = harness();
	let log = Log::default();
	let id = pick(&h, &log, MenuTrigger::Now);
	h.manager.init_tools();
	h.frame.choice.set(Some(1));

	h.manager.invoke_tool("pick");

	assert_eq!(
		log.entries(),
		vec![
			r#"pick choice Some(1) Some("edit.flip") Some("Pick")"#.to_owned(),
			"pick closed".to_owned(),
		]
	);
	assert_eq!(h.frame.popups.borrow().len(), 1);
	assert_eq!(h.frame.popups.borrow()[0], menu());
	assert_eq!(h.frame.owner_during_popup.get(), Some(id));
	assert_eq!(h.manager.menu_owner(), None);
	assert!(!h.manager.is_tool_active(id));
}

#[test]
fn dismissed_menu_only_reports_close() {
	let h = harness();
	let log = Log::default();
	pick(&h, &log, MenuTrigger::Now);
	h.manager.init_tools();

	h.manager.invoke_tool("pick");
	assert_eq!(log.entries(), vec!["pick closed"]);
}

#[test]
fn button_trigger_waits_for_right_click() {
	let h = harness();
	let log = Log::default();
	let id = pick(&h, &log, MenuTrigger::Button);
	h.manager.init_tools();

	h.manager.invoke_tool("pick");
	h.manager.process_event(ToolEvent::click(MouseButtons::LEFT, Point::ORIGIN));
	assert!(h.frame.popups.borrow().is_empty());
	assert!(h.manager.is_tool_active(id));

	h.manager.process_event(right_click());
	assert_eq!(h.frame.popups.borrow().len(), 1);
	assert_eq!(log.entries(), vec!["pick closed"]);
}

#[test]
fn cursor_is_pinned_while_the_menu_is_open() {
	let h = harness();
	let log = Log::default();
	pick(&h, &log, MenuTrigger::Now);
	h.manager.init_tools();
	let at = Point::new(10.0, 20.0);
	h.view.cursor.set(at);

	h.manager.invoke_tool("pick");

	assert_eq!(h.frame.cursor_during_popup.get(), Some(at));
	assert_eq!(h.manager.menu_cursor(), Some(at));
	assert_eq!(*h.view.forced.borrow(), vec![Some(at), None]);
}

#[test]
fn only_the_owner_sees_the_choice() {
	let h = harness();
	let log = Log::default();
	let owner = pick(&h, &log, MenuTrigger::Button);
	let other = spy(&h, &log);
	h.manager.init_tools();
	h.frame.choice.set(Some(2));

	h.manager.invoke_tool("pick");
	h.manager.invoke_tool("spy");
	assert_eq!(h.manager.active_tools(), vec![other, owner]);

	h.manager.process_event(right_click());
	assert_eq!(
		log.entries(),
		vec![
			r#"pick choice Some(2) None Some("Pick")"#.to_owned(),
			"spy closed".to_owned(),
			"pick closed".to_owned(),
		]
	);
}

#[test]
fn host_events_during_popup_are_dispatched_without_reopening() {
	let h = harness();
	let log = Log::default();
	pick(&h, &log, MenuTrigger::Button);
	spy(&h, &log);
	h.manager.init_tools();
	h.frame
		.during_popup
		.borrow_mut()
		.extend([right_click(), ToolEvent::message("ping")]);

	h.manager.invoke_tool("pick");
	h.manager.process_event(right_click());

	assert_eq!(h.frame.popups.borrow().len(), 1);
	assert_eq!(log.entries(), vec!["pick click", "ping", "pick closed"]);
}
