use std::collections::HashMap;

use crate::behavior::{
    ACTIVE_CLASS, ADD_TO_CART_SELECTOR, BTN_PRIMARY_CLASS, BTN_SUCCESS_CLASS, Behavior,
    CART_CONFIRMED_HTML, CART_IDLE_HTML, CART_REVERT_DELAY_MS, DECREASE_BUTTON_ID,
    FILTER_SIDEBAR_ID, FILTER_TOGGLE_ID, INCREASE_BUTTON_ID, MAIN_IMAGE_ID, QUANTITY_INPUT_ID,
    QUANTITY_MAX, QUANTITY_MIN, SHOW_FILTER_CLASS, THUMBNAIL_SELECTOR, TOOLTIP_TRIGGER_SELECTOR,
    normalized_quantity, parse_int_prefix,
};
use crate::dom::{Dom, NodeId};
use crate::{Error, Result, html, selector};

/// The cart mutation the page would send to a backend. The page never
/// performs it; an embedder-installed hook receives one per confirmed
/// add-to-cart click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRequest {
    /// `data-product-id` of the clicked button, when present.
    pub product_id: Option<String>,
    /// Raw quantity field value at click time, `"1"` when the page has no
    /// quantity field.
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    target: NodeId,
    behavior: Behavior,
}

#[derive(Debug, Clone)]
struct TooltipController {
    target: NodeId,
    text: String,
    visible: bool,
}

#[derive(Debug, Clone, Default)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Behavior>>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event: &str, behavior: Behavior) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(behavior);
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Behavior> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct EventState {
    event_type: String,
    target: NodeId,
    current_target: NodeId,
    default_prevented: bool,
}

impl EventState {
    fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
        }
    }
}

/// A loaded product page with its widgets wired, driven through selectors
/// and a virtual clock.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    tooltips: Vec<TooltipController>,
    quantity_input: Option<NodeId>,
    gallery_main: Option<NodeId>,
    gallery_thumbs: Vec<NodeId>,
    filter_sidebar: Option<NodeId>,
    active_element: Option<NodeId>,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    next_timer_id: i64,
    next_task_order: i64,
    cart_hook: Option<Box<dyn FnMut(CartRequest)>>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    /// Parses the markup and runs the page behavior initializer: tooltips,
    /// add-to-cart buttons, the image gallery, the quantity stepper, and
    /// the filter-sidebar toggle. Each widget wires only if its anchor
    /// elements exist.
    pub fn from_html(markup: &str) -> Result<Self> {
        stacker::grow(32 * 1024 * 1024, || Self::from_html_impl(markup))
    }

    fn from_html_impl(markup: &str) -> Result<Self> {
        let dom = html::parse_document(markup)?;
        let mut page = Self {
            dom,
            listeners: ListenerStore::default(),
            tooltips: Vec::new(),
            quantity_input: None,
            gallery_main: None,
            gallery_thumbs: Vec::new(),
            filter_sidebar: None,
            active_element: None,
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
            cart_hook: None,
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        };
        page.wire_page()?;
        Ok(page)
    }

    /// Installs the cart integration hook. Without one, confirmed clicks
    /// animate the button but reach no backend.
    pub fn on_cart_request(&mut self, hook: impl FnMut(CartRequest) + 'static) {
        self.cart_hook = Some(Box::new(hook));
    }

    // --- wiring -------------------------------------------------------

    fn wire_page(&mut self) -> Result<()> {
        self.wire_tooltips()?;
        self.wire_add_to_cart()?;
        self.wire_gallery()?;
        self.wire_quantity_stepper()?;
        self.wire_filter_toggle()?;
        Ok(())
    }

    fn wire_tooltips(&mut self) -> Result<()> {
        for trigger in selector::query_selector_all(&self.dom, TOOLTIP_TRIGGER_SELECTOR)? {
            let text = self
                .dom
                .attr(trigger, "data-bs-title")
                .or_else(|| self.dom.attr(trigger, "title"))
                .unwrap_or_default();
            self.tooltips.push(TooltipController {
                target: trigger,
                text,
                visible: false,
            });
            self.listeners.add(trigger, "mouseenter", Behavior::ShowTooltip);
            self.listeners.add(trigger, "focus", Behavior::ShowTooltip);
            self.listeners.add(trigger, "mouseleave", Behavior::HideTooltip);
            self.listeners.add(trigger, "blur", Behavior::HideTooltip);
        }
        Ok(())
    }

    fn wire_add_to_cart(&mut self) -> Result<()> {
        for button in selector::query_selector_all(&self.dom, ADD_TO_CART_SELECTOR)? {
            self.listeners.add(button, "click", Behavior::AddToCart);
        }
        Ok(())
    }

    fn wire_gallery(&mut self) -> Result<()> {
        let main = self.dom.by_id(MAIN_IMAGE_ID);
        let thumbs = selector::query_selector_all(&self.dom, THUMBNAIL_SELECTOR)?;
        if main.is_none() || thumbs.is_empty() {
            return Ok(());
        }
        self.gallery_main = main;
        for thumb in &thumbs {
            self.listeners.add(*thumb, "click", Behavior::SelectThumbnail);
        }
        self.gallery_thumbs = thumbs;
        Ok(())
    }

    fn wire_quantity_stepper(&mut self) -> Result<()> {
        let (Some(input), Some(increase), Some(decrease)) = (
            self.dom.by_id(QUANTITY_INPUT_ID),
            self.dom.by_id(INCREASE_BUTTON_ID),
            self.dom.by_id(DECREASE_BUTTON_ID),
        ) else {
            return Ok(());
        };
        self.quantity_input = Some(input);
        self.listeners.add(increase, "click", Behavior::IncrementQuantity);
        self.listeners.add(decrease, "click", Behavior::DecrementQuantity);
        self.listeners.add(input, "change", Behavior::ClampQuantity);
        Ok(())
    }

    fn wire_filter_toggle(&mut self) -> Result<()> {
        let (Some(toggle), Some(sidebar)) = (
            self.dom.by_id(FILTER_TOGGLE_ID),
            self.dom.by_id(FILTER_SIDEBAR_ID),
        ) else {
            return Ok(());
        };
        self.filter_sidebar = Some(sidebar);
        self.listeners.add(toggle, "click", Behavior::ToggleFilterSidebar);
        Ok(())
    }

    // --- behavior interpreter -----------------------------------------

    fn run_behavior(&mut self, behavior: Behavior, event: &mut EventState) -> Result<()> {
        match behavior {
            Behavior::ShowTooltip => self.set_tooltip_visible(event.current_target, true),
            Behavior::HideTooltip => self.set_tooltip_visible(event.current_target, false),
            Behavior::AddToCart => self.add_to_cart_clicked(event),
            Behavior::RevertCartButton => self.revert_cart_button(event.current_target),
            Behavior::SelectThumbnail => self.thumbnail_clicked(event.current_target),
            Behavior::IncrementQuantity => self.step_quantity(1),
            Behavior::DecrementQuantity => self.step_quantity(-1),
            Behavior::ClampQuantity => self.clamp_quantity(event.current_target),
            Behavior::ToggleFilterSidebar => self.toggle_filter_sidebar(),
        }
    }

    fn set_tooltip_visible(&mut self, target: NodeId, visible: bool) -> Result<()> {
        for tooltip in &mut self.tooltips {
            if tooltip.target == target {
                tooltip.visible = visible;
            }
        }
        Ok(())
    }

    fn add_to_cart_clicked(&mut self, event: &mut EventState) -> Result<()> {
        event.default_prevented = true;
        let button = event.current_target;

        let product_id = self.dom.attr(button, "data-product-id");
        let quantity = match self.dom.by_id(QUANTITY_INPUT_ID) {
            Some(input) => self.dom.value(input)?,
            None => "1".to_string(),
        };

        self.dom.set_inner_html(button, CART_CONFIRMED_HTML)?;
        self.dom.class_remove(button, BTN_PRIMARY_CLASS)?;
        self.dom.class_add(button, BTN_SUCCESS_CLASS)?;
        self.schedule(button, Behavior::RevertCartButton, CART_REVERT_DELAY_MS);

        if let Some(mut hook) = self.cart_hook.take() {
            hook(CartRequest {
                product_id,
                quantity,
            });
            self.cart_hook = Some(hook);
        }
        Ok(())
    }

    fn revert_cart_button(&mut self, button: NodeId) -> Result<()> {
        self.dom.set_inner_html(button, CART_IDLE_HTML)?;
        self.dom.class_remove(button, BTN_SUCCESS_CLASS)?;
        self.dom.class_add(button, BTN_PRIMARY_CLASS)?;
        Ok(())
    }

    fn thumbnail_clicked(&mut self, thumb: NodeId) -> Result<()> {
        if let (Some(main), Some(image)) = (self.gallery_main, self.dom.attr(thumb, "data-image")) {
            self.dom.set_attr(main, "src", &image)?;
        }
        for other in self.gallery_thumbs.clone() {
            self.dom.class_remove(other, ACTIVE_CLASS)?;
        }
        self.dom.class_add(thumb, ACTIVE_CLASS)?;
        Ok(())
    }

    fn step_quantity(&mut self, delta: i64) -> Result<()> {
        let Some(input) = self.quantity_input else {
            return Ok(());
        };
        let Some(current) = parse_int_prefix(&self.dom.value(input)?) else {
            // Unparseable field: the stepper has no base to step from.
            return Ok(());
        };
        let stepped = match delta {
            1 if current < QUANTITY_MAX => current + 1,
            -1 if current > QUANTITY_MIN => current - 1,
            _ => return Ok(()),
        };
        self.dom.set_value(input, &stepped.to_string())
    }

    fn clamp_quantity(&mut self, input: NodeId) -> Result<()> {
        let raw = self.dom.value(input)?;
        let normalized = normalized_quantity(&raw);
        self.dom.set_value(input, &normalized.to_string())
    }

    fn toggle_filter_sidebar(&mut self) -> Result<()> {
        if let Some(sidebar) = self.filter_sidebar {
            self.dom.class_toggle(sidebar, SHOW_FILTER_CLASS)?;
        }
        Ok(())
    }

    // --- user interactions --------------------------------------------

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let click_outcome = self.dispatch_event(target, "click")?;
        if click_outcome.default_prevented {
            return Ok(());
        }

        if self.is_submit_control(target) {
            if let Some(form) = self.dom.find_ancestor_by_tag(target, "form") {
                self.dispatch_event(form, "submit")?;
            }
        }

        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.editable_target(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Types and commits in one step, the way a user edits a field and
    /// tabs away: value change, `input`, then `change`.
    pub fn edit_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.editable_target(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        Ok(())
    }

    pub fn hover(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, "mouseenter")?;
        Ok(())
    }

    pub fn unhover(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, "mouseleave")?;
        Ok(())
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        if self.active_element == Some(target) {
            return Ok(());
        }
        if let Some(current) = self.active_element {
            self.dispatch_event(current, "blur")?;
        }
        self.active_element = Some(target);
        self.dispatch_event(target, "focus")?;
        Ok(())
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.active_element != Some(target) {
            return Ok(());
        }
        self.dispatch_event(target, "blur")?;
        self.active_element = None;
        Ok(())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    fn editable_target(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        Ok(target)
    }

    fn is_submit_control(&self, node: NodeId) -> bool {
        let Some(tag) = self.dom.tag_name(node) else {
            return false;
        };
        let kind = self
            .dom
            .attr(node, "type")
            .map(|t| t.to_ascii_lowercase());
        match tag {
            // A button without an explicit type submits its form.
            "button" => kind.as_deref().is_none_or(|k| k == "submit"),
            "input" => kind.as_deref() == Some("submit"),
            _ => false,
        }
    }

    // --- event dispatch -----------------------------------------------

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let mut event = EventState::new(event_type, target);

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        // Target phase, then bubble through ancestors.
        let mut invoked = 0usize;
        for node in path {
            event.current_target = node;
            for behavior in self.listeners.get(node, event_type) {
                invoked += 1;
                self.run_behavior(behavior, &mut event)?;
            }
        }

        if self.trace {
            let line = format!(
                "[event] {} target={} listeners_invoked={} default_prevented={}",
                event.event_type,
                self.node_label(event.target),
                invoked,
                event.default_prevented
            );
            self.push_trace(line);
        }
        Ok(event)
    }

    // --- virtual clock ------------------------------------------------

    fn schedule(&mut self, target: NodeId, behavior: Behavior, delay_ms: i64) -> i64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            target,
            behavior,
        });
        if self.trace {
            self.push_trace(format!(
                "[timer] schedule id={id} due_at={due_at} behavior={behavior:?}"
            ));
        }
        id
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Timer(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms;
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(self.now_ms), false)?;
        if self.trace {
            self.push_trace(format!(
                "[timer] advance from={from} to={} ran_due={ran}",
                self.now_ms
            ));
        }
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.now_ms {
            return Err(Error::Timer(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.now_ms
            )));
        }
        let from = self.now_ms;
        self.now_ms = target_ms;
        let ran = self.run_timer_queue(Some(self.now_ms), false)?;
        if self.trace {
            self.push_trace(format!(
                "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
            ));
        }
        Ok(())
    }

    /// Runs every scheduled task, advancing the clock to each task's due
    /// time. Nothing the page schedules reschedules itself, so this always
    /// terminates.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        if self.trace {
            self.push_trace(format!(
                "[timer] flush from={from} to={} ran={ran}",
                self.now_ms
            ));
        }
        Ok(())
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            let task = self.task_queue.remove(next_idx);
            if advance_clock && task.due_at > self.now_ms {
                self.now_ms = task.due_at;
            }
            if self.trace {
                self.push_trace(format!(
                    "[timer] run id={} due_at={} behavior={:?} now_ms={}",
                    task.id, task.due_at, task.behavior, self.now_ms
                ));
            }
            let mut event = EventState::new("timeout", task.target);
            self.run_behavior(task.behavior, &mut event)?;
        }
        Ok(steps)
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    // --- queries and assertions ---------------------------------------

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.class_contains(target, class_name)
    }

    pub fn inner_html(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.inner_html(target)
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(selector::query_selector_all(&self.dom, selector)?.len())
    }

    pub fn tooltip_visible(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.tooltips
            .iter()
            .find(|tooltip| tooltip.target == target)
            .map(|tooltip| tooltip.visible)
            .ok_or_else(|| Error::Dom(format!("no tooltip controller wired for {selector}")))
    }

    pub fn tooltip_text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.tooltips
            .iter()
            .find(|tooltip| tooltip.target == target)
            .map(|tooltip| tooltip.text.clone())
            .ok_or_else(|| Error::Dom(format!("no tooltip controller wired for {selector}")))
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.class_contains(target, class_name)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{class_name}={expected}"),
                actual: format!("{class_name}={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, sel: &str) -> Result<NodeId> {
        selector::query_selector(&self.dom, sel)?
            .ok_or_else(|| Error::SelectorNotFound(sel.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn node_label(&self, node_id: NodeId) -> String {
        let Some(tag) = self.dom.tag_name(node_id) else {
            return "#document".to_string();
        };
        match self.dom.attr(node_id, "id") {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        }
    }

    // --- tracing ------------------------------------------------------

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    fn push_trace(&mut self, line: String) {
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let truncated: String = input.chars().take(max_chars).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_anchors_wire_nothing() -> Result<()> {
        let page = Page::from_html("<p id='lonely'>nothing to wire</p>")?;
        assert!(page.tooltips.is_empty());
        assert!(page.quantity_input.is_none());
        assert!(page.gallery_main.is_none());
        assert!(page.filter_sidebar.is_none());
        assert!(page.listeners.map.is_empty());
        Ok(())
    }

    #[test]
    fn gallery_needs_both_main_image_and_thumbnails() -> Result<()> {
        let page = Page::from_html(r#"<img class="product-thumbnail" data-image="a.jpg">"#)?;
        assert!(page.gallery_main.is_none());
        assert!(page.gallery_thumbs.is_empty());

        let page = Page::from_html(r#"<img id="main-product-image" src="x.jpg">"#)?;
        assert!(page.gallery_main.is_none());
        Ok(())
    }

    #[test]
    fn stepper_needs_all_three_anchors() -> Result<()> {
        let page = Page::from_html(
            r#"<input id="product-quantity" value="1">
               <button id="increase-quantity">+</button>"#,
        )?;
        assert!(page.quantity_input.is_none());
        Ok(())
    }

    #[test]
    fn timers_order_by_due_time_then_fifo() -> Result<()> {
        let mut page = Page::from_html("<div id='d'></div>")?;
        let node = page.dom.by_id("d").expect("div");
        page.schedule(node, Behavior::RevertCartButton, 50);
        page.schedule(node, Behavior::RevertCartButton, 10);
        page.schedule(node, Behavior::RevertCartButton, 10);
        let timers = page.pending_timers();
        assert_eq!(
            timers.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
        Ok(())
    }

    #[test]
    fn advance_time_rejects_negative_delta() -> Result<()> {
        let mut page = Page::from_html("<div></div>")?;
        assert!(matches!(page.advance_time(-1), Err(Error::Timer(_))));
        Ok(())
    }

    #[test]
    fn trace_captures_event_and_timer_lines() -> Result<()> {
        let html = r#"
            <button class="add-to-cart-btn btn-primary" data-product-id="3">add</button>
        "#;
        let mut page = Page::from_html(html)?;
        page.enable_trace(true);
        page.set_trace_stderr(false);
        page.click(".add-to-cart-btn")?;
        page.flush()?;
        let logs = page.take_trace_logs();
        assert!(logs.iter().any(|line| line.starts_with("[event] click")));
        assert!(logs.iter().any(|line| line.starts_with("[timer] run")));
        Ok(())
    }
}
