use crate::endpoints::ApiEndpoint;
use crate::entities::{Employee, EmployeeForm, EmployeeStatus};
use crate::error::Result;
use crate::role::Capability;
use crate::session::SessionContext;

/// Roster management. Only administrators receive this handle.
#[derive(Clone, Copy, Debug)]
pub struct DirectoryApi<'a> {
    session: &'a SessionContext,
}

impl<'a> DirectoryApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Active employees.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Employee>> {
        self.session.client().get(ApiEndpoint::Employees).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, employee_id: &str) -> Result<Employee> {
        fetch_employee(self.session, employee_id).await
    }

    /// Validates the form and creates the employee.
    ///
    /// A duplicate `employee_id` is reported as `Error::Conflict`.
    #[instrument(skip(self, form), fields(employee_id = %form.employee_id))]
    pub async fn create(&self, form: &EmployeeForm) -> Result<Employee> {
        let draft = form.validate()?;
        let employee: Employee = self
            .session
            .client()
            .post_endpoint(ApiEndpoint::Employees, &draft)
            .await?;
        info!(employee_id = %employee.employee_id, "created employee");
        Ok(employee)
    }

    /// Replaces the employee's record with the validated form.
    #[instrument(skip(self, form))]
    pub async fn update(&self, employee_id: &str, form: &EmployeeForm) -> Result<Employee> {
        let draft = form.validate()?;
        let employee: Employee = self
            .session
            .client()
            .put_endpoint(ApiEndpoint::Employee(employee_id.to_string()), &draft)
            .await
            .map_err(|e| e.for_entity("Employee", employee_id))?;
        info!(employee_id = %employee.employee_id, "updated employee");
        Ok(employee)
    }

    /// Activates or deactivates an employee, keeping every other field.
    #[instrument(skip(self))]
    pub async fn set_status(&self, employee_id: &str, status: EmployeeStatus) -> Result<Employee> {
        let mut form = self.get(employee_id).await?.to_form();
        form.status = Some(status);
        self.update(employee_id, &form).await
    }
}

pub(crate) async fn fetch_employee(session: &SessionContext, employee_id: &str) -> Result<Employee> {
    session
        .client()
        .get(ApiEndpoint::Employee(employee_id.to_string()))
        .await
        .map_err(|e| e.for_entity("Employee", employee_id))
}

impl SessionContext {
    /// Roster management, for administrators.
    pub fn directory(&self) -> Result<DirectoryApi<'_>> {
        self.require(Capability::ManageEmployees)?;
        Ok(DirectoryApi::new(self))
    }

    /// The caller's own employee record.
    #[instrument(skip(self))]
    pub async fn own_employee_record(&self) -> Result<Employee> {
        self.require(Capability::ViewEmployee)?;
        let employee_id = self.require_employee_link("employees.read")?;
        fetch_employee(self, employee_id).await
    }
}
