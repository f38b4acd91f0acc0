//! Text rendering of the analysis view.

use finlight_core::{
    CategorySlice, LedgerDocument, MonthlyAnalytics, ShortfallStatus, expenses_in_month,
    format_date_human, format_money, incomes_in_month,
};

const BAR_WIDTH: usize = 24;

/// Proportional bar chart with a legend line per slice.
pub fn render_breakdown(slices: &[CategorySlice], currency: &str) -> String {
    let total: f64 = slices.iter().map(|s| s.value).sum();
    let name_width = slices.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for s in slices {
        let share = if total > 0.0 { s.value / total } else { 0.0 };
        let filled = ((share * BAR_WIDTH as f64).round() as usize).clamp(1, BAR_WIDTH);
        out.push_str(&format!(
            "{:<nw$}  {:<bw$}  {:>5.1}%  {}\n",
            s.name,
            "#".repeat(filled),
            share * 100.0,
            format_money(s.value, currency),
            nw = name_width,
            bw = BAR_WIDTH,
        ));
    }
    out
}

fn shortfall_hint(a: &MonthlyAnalytics) -> &'static str {
    match a.shortfall_status() {
        ShortfallStatus::Shortfall => " (to cover the model)",
        ShortfallStatus::Surplus => " (surplus)",
        ShortfallStatus::Balanced => "",
    }
}

pub fn render_report(doc: &LedgerDocument, a: &MonthlyAnalytics, currency: &str) -> String {
    let money = |v: f64| format_money(v, currency);
    let mut s = String::new();

    s.push_str(&format!("# Finances for {}\n\n", a.month));
    s.push_str(&format!("Income (month):            {}\n", money(a.total_income)));
    s.push_str(&format!("Expenses (month):          {}\n", money(a.total_expense)));
    s.push_str(&format!("Net (income - expenses):   {}\n", money(a.balance)));
    s.push_str(&format!("Desired income:            {}\n", money(a.desired_income)));
    s.push_str(&format!("  current income:          {}\n", money(a.total_income)));
    s.push_str(&format!(
        "  shortfall:               {}{}\n",
        money(a.shortfall),
        shortfall_hint(a)
    ));
    s.push_str(&format!("  required extra:          {}\n\n", money(a.required_extra)));

    s.push_str(&format!(
        "## {}/{}/{} split\n\n",
        a.split.needs, a.split.invest, a.split.fun
    ));
    s.push_str(&format!(
        "Needs: {}  |  Investment: {}  |  Fun: {}\n\n",
        money(a.needs_target),
        money(a.invest_target),
        money(a.fun_target)
    ));

    s.push_str("## Expenses by category\n\n");
    s.push_str(&render_breakdown(&a.categories, currency));
    s.push('\n');

    s.push_str("## Debts\n\n");
    if doc.debts.is_empty() {
        s.push_str("(none)\n");
    } else {
        for d in &doc.debts {
            let mark = if d.done { "x" } else { " " };
            s.push_str(&format!("[{mark}] {}  {}  (id {})\n", d.name, money(d.amount), d.id));
        }
        s.push_str(&format!(
            "Open: {} totalling {}; done: {}\n",
            a.debts.open_count,
            money(a.debts.open_total),
            a.debts.done_count
        ));
    }
    s.push('\n');

    s.push_str("## Expenses\n\n");
    let mut any = false;
    for e in expenses_in_month(doc, &a.month) {
        any = true;
        let note = e.note.as_deref().unwrap_or("");
        s.push_str(&format!(
            "{}  {:<18} {:<24} {:>12}  (id {})\n",
            e.date.map(format_date_human).unwrap_or_default(),
            e.category,
            note,
            money(e.amount),
            e.id
        ));
    }
    if !any {
        s.push_str("(no expenses this month)\n");
    }
    s.push('\n');

    s.push_str("## Incomes\n\n");
    let mut any = false;
    for i in incomes_in_month(doc, &a.month) {
        any = true;
        s.push_str(&format!(
            "{}  {:<43} {:>12}  (id {})\n",
            i.date.map(format_date_human).unwrap_or_default(),
            i.label,
            money(i.amount),
            i.id
        ));
    }
    if !any {
        s.push_str("(no incomes this month)\n");
    }
    s
}
